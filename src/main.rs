pub mod cli;
pub mod codegen;
pub mod decode;
pub mod merge;
pub mod model;
pub mod optional;
pub mod path_de;
pub mod schema;
pub mod swagger;

use colored::Colorize;

fn main() {
    let command_line_interface = cli::CommandLineInterface::load();
    if let Err(error) = command_line_interface.run() {
        eprintln!("{} {error:#}", "error:".red().bold());
        std::process::exit(1);
    }
}
