use std::{cell::RefCell, rc::Rc};

use clap::Parser;

use melhorzin::interpreter::Value;

#[derive(Debug, Parser)]
#[command(about = "Interpreter for the melhorzin emoji-keyword scripting language")]
struct Cli {
    /// Path of the source file to run.
    file: String,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let source = match std::fs::read_to_string(&cli.file) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("error reading {}: {e}", cli.file);
            std::process::exit(1);
        }
    };

    match melhorzin::run(&source, Rc::new(RefCell::new(std::io::stdout()))) {
        Ok(Value::Unit) => {}
        Ok(value) => println!("{value}"),
        Err(e) => println!("{e}"),
    }
}
