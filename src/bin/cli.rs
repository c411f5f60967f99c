#![cfg(not(tarpaulin_include))]

use report_console::parameter::{Parameter, check_name, short_label};
use std::io::{self, Write};
use std::time::Instant;

fn print_help() {
    println!("Commands:");
    println!("  q: Quit");
    println!("  decode <token>: Show the parts of a parameter token");
    println!("  encode <name> [min max] [unit]: Build a token");
    println!("  check <token>: Check the range of a token");
    println!("  label <catalog name>: Strip the catalog prefix");
    println!("  <token>: Same as decode");
}

fn describe(parameter: &Parameter) {
    println!("  base name : {}", parameter.base_name());
    match parameter.range() {
        Some((min, max)) => println!("  range     : {} to {}", min, max),
        None => println!("  range     : -"),
    }
    let unit = parameter.unit();
    println!("  unit      : {}", if unit.is_empty() { "-" } else { unit });
    println!("  display   : {}", parameter.display_name());
}

/// Parse `<name> [min max] [unit]`
fn parse_encode(args: &[&str]) -> Result<Parameter, String> {
    let (name, rest) = args.split_first().ok_or("missing name")?;
    check_name(name).map_err(|e| e.to_string())?;

    match rest {
        [] => Ok(Parameter::bare(*name)),
        [unit] => Ok(Parameter::with_unit(*name, *unit)),
        [min, max] | [min, max, _] => {
            let min: i64 = min.parse().map_err(|_| format!("invalid bound: {}", min))?;
            let max: i64 = max.parse().map_err(|_| format!("invalid bound: {}", max))?;
            let unit = rest.get(2).copied().unwrap_or("");
            Ok(Parameter::ranged(*name, min, max, unit))
        }
        _ => Err("too many arguments".to_string()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut start_time = Instant::now();
    let mut status = String::from("ok");

    loop {
        let elapsed_time = start_time.elapsed().as_secs_f64();
        print!("[{:.1}] ({}) > ", elapsed_time, status);
        io::stdout().flush()?;

        let mut command = String::new();
        if io::stdin().read_line(&mut command)? == 0 {
            break;
        }
        let command = command.trim();
        start_time = Instant::now();

        if command.is_empty() {
            status = String::from("invalid command");
            continue;
        }

        let words: Vec<&str> = command.split_whitespace().collect();
        match words.as_slice() {
            ["q"] => break,
            ["help"] => {
                print_help();
                status = String::from("ok");
            }
            ["encode", args @ ..] => match parse_encode(args).and_then(|p| p.encode().map_err(|e| e.to_string())) {
                Ok(token) => {
                    println!("{}", token);
                    status = String::from("ok");
                }
                Err(e) => status = e,
            },
            ["check", token] => {
                let parameter = Parameter::decode(token);
                status = if parameter.validate_range() {
                    String::from("ok")
                } else {
                    String::from("invalid range")
                };
            }
            ["label", name] => {
                println!("{}", short_label(name));
                status = String::from("ok");
            }
            ["decode", token] | [token] => {
                describe(&Parameter::decode(token));
                status = String::from("ok");
            }
            _ => status = String::from("invalid command"),
        }
    }

    Ok(())
}
