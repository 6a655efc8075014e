//! Command-line host for the mining library: reads a CSV transaction
//! file, builds the recoded bag, runs the selected engine, and writes
//! item-set or rule records to an output file. Mirrors the teacher's
//! `command_line_args.rs`/`main.rs` structure (argparse-driven flags,
//! plain-`println!` progress gated behind `--verbose`) with the flag set
//! SPEC_FULL.md §6 names instead of the teacher's rule-mining-specific
//! flags.

use std::fs::File;
use std::io::{prelude::*, BufReader, BufWriter};
use std::process;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

use argparse::{ArgumentParser, Store, StoreTrue};

use fim::bag::{Transaction, TransactionBag};
use fim::item::{ItemBase, ItemObj};
use fim::options::{parse_algorithm, parse_border, parse_eval, parse_target, MineOptions};
use fim::reporter::{Aggregate, ReportField};
use fim::rules::{rank_unique, Rule};
use fim::{mine, MineResult};

struct Arguments {
    input_path: String,
    output_path: String,
    target: String,
    algorithm: String,
    supp: f64,
    conf: f64,
    zmin: usize,
    zmax: usize,
    eval: String,
    thresh: f64,
    report: String,
    border: String,
    mode: String,
    verbose: bool,
}

fn parse_args_or_exit() -> Arguments {
    let mut args = Arguments {
        input_path: String::new(),
        output_path: String::new(),
        target: "sets".to_string(),
        algorithm: "apriori".to_string(),
        supp: 0.1,
        conf: 0.0,
        zmin: 1,
        zmax: 0,
        eval: "none".to_string(),
        thresh: 0.0,
        report: "s".to_string(),
        border: String::new(),
        mode: String::new(),
        verbose: false,
    };

    {
        let mut parser = ArgumentParser::new();
        parser.set_description("Frequent itemset mining and association rule induction.");

        parser
            .refer(&mut args.input_path)
            .add_option(&["--input"], Store, "Input transaction dataset in CSV format.")
            .metavar("file_path")
            .required();

        parser
            .refer(&mut args.output_path)
            .add_option(&["--output"], Store, "File path in which to store results.")
            .metavar("file_path")
            .required();

        parser
            .refer(&mut args.target)
            .add_option(
                &["--target"],
                Store,
                "What to mine: sets|closed|maximal|generators|rules.",
            )
            .metavar("target");

        parser
            .refer(&mut args.algorithm)
            .add_option(
                &["--algo"],
                Store,
                "Mining engine: apriori|eclat|fpgrowth|sam|relim|carpenter|ista.",
            )
            .metavar("algo");

        parser
            .refer(&mut args.supp)
            .add_option(
                &["--supp"],
                Store,
                "Minimum support, as a fraction of transactions in [0,1].",
            )
            .metavar("fraction");

        parser
            .refer(&mut args.conf)
            .add_option(&["--conf"], Store, "Minimum rule confidence in [0,1].")
            .metavar("fraction");

        parser
            .refer(&mut args.zmin)
            .add_option(&["--zmin"], Store, "Minimum itemset size.")
            .metavar("size");

        parser
            .refer(&mut args.zmax)
            .add_option(&["--zmax"], Store, "Maximum itemset size, 0 for unbounded.")
            .metavar("size");

        parser
            .refer(&mut args.eval)
            .add_option(&["--eval"], Store, "Rule evaluation measure code.")
            .metavar("measure");

        parser
            .refer(&mut args.thresh)
            .add_option(&["--thresh"], Store, "Evaluation measure threshold.")
            .metavar("value");

        parser
            .refer(&mut args.report)
            .add_option(&["--report"], Store, "Report character string, e.g. \"asSc\".")
            .metavar("chars");

        parser
            .refer(&mut args.border)
            .add_option(&["--border"], Store, "Comma-separated per-size minimum support.")
            .metavar("list");

        parser
            .refer(&mut args.mode)
            .add_option(
                &["--mode"],
                Store,
                "Engine-specific variant string (Eclat representation, FP-growth \
                 complex/simple/topdown/single, Apriori '+'-joined flags, or \
                 Carpenter/IsTa row representation).",
            )
            .metavar("mode");

        parser
            .refer(&mut args.verbose)
            .add_option(&["--verbose"], StoreTrue, "Print progress/timing diagnostics.");

        match parser.parse_args() {
            Ok(()) => {}
            Err(err) => process::exit(err),
        }
    }

    args
}

fn read_transactions(path: &str, base: &mut ItemBase) -> std::io::Result<Vec<Transaction>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut out = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        for field in line.split(',') {
            base.add2ta(ItemObj::Str(field.trim().into())).unwrap();
        }
        let ids = base.finta(1);
        if !ids.is_empty() {
            out.push(Transaction::new(ids, 1));
        }
    }
    Ok(out)
}

fn build_options(args: &Arguments, total_weight: u64) -> Result<MineOptions, String> {
    let algorithm = parse_algorithm(&args.algorithm).map_err(|e| e.to_string())?;
    let target = parse_target(&args.target).map_err(|e| e.to_string())?;
    let eval = parse_eval(&args.eval).map_err(|e| e.to_string())?;
    let border = parse_border(&args.border).map_err(|e| e.to_string())?;
    let smin = ((args.supp * total_weight as f64).ceil() as u64).max(1);
    let zmax = if args.zmax == 0 { None } else { Some(args.zmax) };

    Ok(MineOptions {
        algorithm,
        target,
        smin,
        zmin: args.zmin,
        zmax,
        conf_min: args.conf,
        eval,
        agg: Aggregate::None,
        thresh: args.thresh,
        prune: 0,
        border,
        report: ReportField::parse_str(&args.report),
        mode: args.mode.clone(),
    })
}

fn write_sets(path: &str, sets: &[fim::reporter::SetRecord], base: &ItemBase) -> std::io::Result<()> {
    let file = File::create(path)?;
    let mut w = BufWriter::new(file);
    for s in sets {
        let names: Vec<String> = s.items.iter().map(|&id| item_name(base, id)).collect();
        let info: Vec<String> = s.info.iter().map(|v| format!("{v}")).collect();
        writeln!(w, "{} ({})", names.join(" "), info.join(","))?;
    }
    Ok(())
}

fn write_rules(
    path: &str,
    records: &[fim::reporter::RuleRecord],
    base: &ItemBase,
    bag: &TransactionBag,
) -> std::io::Result<()> {
    let ranked = rank_unique(
        records
            .iter()
            .map(|r| {
                let body_supp = bag.support(&r.antecedent).max(1);
                let head_supp = bag.support(&[r.consequent]).max(1);
                let conf = r.support as f64 / body_supp as f64;
                let total = bag.total_weight().max(1) as f64;
                let lift = (r.support as f64 * total) / (body_supp as f64 * head_supp as f64);
                Rule::from_record(r, conf, lift)
            })
            .collect(),
    );

    let file = File::create(path)?;
    let mut w = BufWriter::new(file);
    for r in &ranked {
        let body: Vec<String> = r.antecedent.iter().map(|&id| item_name(base, id)).collect();
        let head = item_name(base, r.consequent);
        writeln!(
            w,
            "{} -> {} (conf={:.4}, lift={:.4}, supp={})",
            body.join(" "),
            head,
            r.confidence.0,
            r.lift.0,
            r.support
        )?;
    }
    Ok(())
}

fn item_name(base: &ItemBase, id: fim::item::ItemId) -> String {
    match base.obj(id) {
        ItemObj::Int(i) => i.to_string(),
        ItemObj::Str(s) => s.to_string(),
    }
}

fn main() {
    let args = parse_args_or_exit();
    let start = Instant::now();

    let mut base = ItemBase::new();
    let transactions = match read_transactions(&args.input_path, &mut base) {
        Ok(t) => t,
        Err(err) => {
            eprintln!("error reading '{}': {}", args.input_path, err);
            process::exit(1);
        }
    };
    if args.verbose {
        println!(
            "read {} transactions, {} distinct items, in {:?}",
            transactions.len(),
            base.len(),
            start.elapsed()
        );
    }

    let mut bag = TransactionBag::new(base);
    for t in transactions {
        bag.push(t);
    }
    let total_weight = bag.total_weight();

    let mine_opts = match build_options(&args, total_weight) {
        Ok(o) => o,
        Err(msg) => {
            eprintln!("error: {msg}");
            process::exit(1);
        }
    };

    let abort = Arc::new(AtomicBool::new(false));
    let mine_start = Instant::now();
    let result = match mine(&bag, &mine_opts, abort) {
        Ok(r) => r,
        Err(err) => {
            eprintln!("mining failed: {err}");
            process::exit(1);
        }
    };
    if args.verbose {
        println!("mined in {:?}", mine_start.elapsed());
    }

    let write_result = match &result {
        MineResult::Sets(sets) => {
            if args.verbose {
                println!("{} item sets reported", sets.len());
            }
            write_sets(&args.output_path, sets, &bag.base)
        }
        MineResult::Rules(rules) => {
            if args.verbose {
                println!("{} rules reported", rules.len());
            }
            write_rules(&args.output_path, rules, &bag.base, &bag)
        }
    };
    if let Err(err) = write_result {
        eprintln!("error writing '{}': {}", args.output_path, err);
        process::exit(1);
    }
}
