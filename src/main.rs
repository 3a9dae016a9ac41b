// asmc - compile and run assembly-like source on the register/memory VM

use asmc::compiler::Compiler;
use asmc::config::Config;
use asmc::console::StdConsole;
use asmc::dump;
use asmc::interpreter::Interpreter;
use asmc::vm::VM;
use log::{debug, info};
use std::env;
use std::fs;
use std::path::Path;
use std::process;

fn main() {
    // Initialize logging
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage(&args[0]);
        process::exit(1);
    }

    let mut input_file = "";
    let mut config_file = None;
    let mut dump_file = None;
    let mut show_tables = false;
    let mut run = true;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: --config requires a filename");
                    process::exit(1);
                }
                config_file = Some(args[i + 1].clone());
                i += 2;
            }
            "--dump" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: --dump requires a filename");
                    process::exit(1);
                }
                dump_file = Some(args[i + 1].clone());
                i += 2;
            }
            "--tables" => {
                show_tables = true;
                i += 1;
            }
            "--no-run" => {
                run = false;
                i += 1;
            }
            "-h" | "--help" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            arg if arg.starts_with('-') => {
                eprintln!("Error: Unknown option '{}'", arg);
                print_usage(&args[0]);
                process::exit(1);
            }
            _ => {
                if input_file.is_empty() {
                    input_file = &args[i];
                } else {
                    eprintln!("Error: Multiple input files specified");
                    process::exit(1);
                }
                i += 1;
            }
        }
    }

    if input_file.is_empty() {
        eprintln!("Error: No input file specified");
        print_usage(&args[0]);
        process::exit(1);
    }

    let config = match config_file {
        Some(path) => match Config::load(Path::new(&path)) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("Error loading config: {}", err);
                process::exit(1);
            }
        },
        None => Config::default(),
    };
    debug!("{:?}", config);
    let max_steps = config.max_steps;

    // Compile
    let compiler = Compiler::new(config);
    let program = match compiler.compile_file(Path::new(input_file)) {
        Ok(program) => program,
        Err(err) => {
            eprintln!("Compilation error: {}", err);
            process::exit(1);
        }
    };

    for diag in &program.diagnostics {
        eprintln!("{}: {}", input_file, diag);
    }

    if show_tables || dump_file.is_some() {
        let text = dump::render(&program);
        if show_tables {
            print!("{}", text);
        }
        if let Some(path) = dump_file {
            if let Err(err) = fs::write(&path, text) {
                eprintln!("Error writing '{}': {}", path, err);
                process::exit(1);
            }
            info!("Wrote intermediate code to {}", path);
        }
    }

    if !run {
        return;
    }

    let mut console = StdConsole::new();
    let mut interpreter = Interpreter::new(VM::new(program), &mut console);
    if let Err(err) = interpreter.run_with_limit(max_steps) {
        eprintln!("\nError during execution: {}", err);
        process::exit(1);
    }
    debug!("Program ended normally after {} steps", interpreter.vm.steps);

    if show_tables {
        println!();
        println!("=== MEMORY ===");
        print!("{}", interpreter.vm.memory);
    }
}

fn print_usage(program_name: &str) {
    println!("Usage: {} [options] <input.asm>", program_name);
    println!();
    println!("Options:");
    println!("  --config <file>        Capacities and limits (TOML)");
    println!("  --dump <file>          Write symbol, label and code tables to a file");
    println!("  --tables               Print the tables and the final memory image");
    println!("  --no-run               Compile only");
    println!("  -h, --help             Show this help message");
    println!();
    println!("Set RUST_LOG=debug to trace compilation and execution.");
}
