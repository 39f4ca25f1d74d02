use std::env;
use std::fs;
use std::io::{self, Read};
use std::process;

use loremark_core::{evaluate, extract_links, parse};
use serde_json::Value;

fn main() {
    let mut input: Option<String> = None;
    let mut links = false;
    let mut universe = String::from("home");
    let mut context_path: Option<String> = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_usage();
                return;
            }
            "--links" => links = true,
            "--universe" => {
                universe = match args.next() {
                    Some(name) => name,
                    None => {
                        eprintln!("--universe expects a shortname");
                        print_usage();
                        process::exit(2);
                    }
                };
            }
            "--context" => {
                context_path = match args.next() {
                    Some(path) => Some(path),
                    None => {
                        eprintln!("--context expects a JSON file");
                        print_usage();
                        process::exit(2);
                    }
                };
            }
            _ => {
                if input.is_none() {
                    input = Some(arg);
                } else {
                    eprintln!("unexpected argument: {}", arg);
                    print_usage();
                    process::exit(2);
                }
            }
        }
    }

    let source = match input {
        Some(path) => fs::read_to_string(&path).unwrap_or_else(|err| {
            eprintln!("failed to read {}: {}", path, err);
            process::exit(1);
        }),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .unwrap_or_else(|err| {
                    eprintln!("failed to read stdin: {}", err);
                    process::exit(1);
                });
            buffer
        }
    };

    let ctx = match context_path {
        Some(path) => {
            let raw = fs::read_to_string(&path).unwrap_or_else(|err| {
                eprintln!("failed to read {}: {}", path, err);
                process::exit(1);
            });
            serde_json::from_str(&raw).unwrap_or_else(|err| {
                eprintln!("invalid context JSON in {}: {}", path, err);
                process::exit(1);
            })
        }
        None => Value::Null,
    };

    let output = if links {
        let refs = extract_links(&universe, &source, &ctx);
        serde_json::to_string_pretty(&refs)
    } else {
        let tree = parse(&source);
        let rendered = evaluate(&tree, &universe, &ctx, None);
        serde_json::to_string_pretty(&rendered)
    };

    match output {
        Ok(json) => println!("{}", json),
        Err(err) => {
            eprintln!("failed to serialize output: {}", err);
            process::exit(1);
        }
    }
}

fn print_usage() {
    eprintln!(
        "Usage: loremark-cli [--links] [--universe NAME] [--context FILE] [input]\n\n\
         Reads loremark markup from a file or stdin and prints the evaluated\n\
         tree as JSON, or with --links the cross-references it contains.\n\
         The universe defaults to \"home\"."
    );
}
