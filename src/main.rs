use clap::Parser;
use i8085_loader::constant::NAME;
use i8085_loader::data::{LoadError, LoadErrorCode, Program};
use i8085_loader::loader;
use i8085_loader::memory::SystemMemory;
use i8085_loader::set_verbosity;
use std::io;
use std::process::exit;

#[derive(Parser, Debug)]
#[command(
    name = NAME,
    version,
    about = "Loads section-based .program files into a 64KB Intel 8085 memory image"
)]
struct Cli {
    /// Program file to load (must carry the .program extension)
    program: String,

    /// Increase verbosity; repeat for more detail (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Dump a memory range after loading, ssss:eeee in hex; with no value,
    /// both loaded sections are dumped
    #[arg(
        short,
        long,
        value_name = "ssss:eeee",
        num_args = 0..=1,
        default_missing_value = ""
    )]
    dump: Option<String>,
}

fn handle_fatal_load_err(err: LoadError) -> ! {
    println!("{err}");
    exit(1)
}

fn parse_dump_range(range: &str) -> Option<(u16, u16)> {
    let (start, end) = range.split_once(':')?;
    let start = u16::from_str_radix(start, 16).ok()?;
    let end = u16::from_str_radix(end, 16).ok()?;
    (start <= end).then_some((start, end))
}

// The validator bounds both sections inside memory, so the end addresses
// here cannot wrap.
fn loaded_section_ranges(program: &Program) -> Vec<(u16, u16)> {
    let mut ranges = Vec::new();
    if !program.data.bytes.is_empty() {
        let start = program.data.starting_address;
        ranges.push((start, start + (program.data.bytes.len() - 1) as u16));
    }
    let code_start = program.code.starting_address;
    ranges.push((
        code_start,
        code_start + (program.code.encoded_len() - 1) as u16,
    ));
    ranges
}

fn main() {
    let cli = Cli::parse();
    set_verbosity(cli.verbose as usize);

    let mut memory = SystemMemory::new();
    let program = match loader::try_load(&mut memory, &cli.program) {
        Ok(program) => program,
        Err(err) => handle_fatal_load_err(err),
    };
    println!("loaded [ {} ] into memory {program}", cli.program);

    if let Some(range) = cli.dump {
        let ranges = if range.is_empty() {
            loaded_section_ranges(&program)
        } else {
            match parse_dump_range(&range) {
                Some(parsed) => vec![parsed],
                None => handle_fatal_load_err(LoadError::new(
                    LoadErrorCode::CliArgError,
                    format!("[ {range} ] is not a valid dump range, expected ssss:eeee in hex"),
                )),
            }
        };
        let mut out = io::stdout().lock();
        for (start, end) in ranges {
            if let Err(err) = memory.dump_range(&mut out, start, end) {
                handle_fatal_load_err(LoadError::new(
                    LoadErrorCode::OutputWriteError,
                    format!("error writing memory dump :: {err}"),
                ));
            }
        }
    }
}
