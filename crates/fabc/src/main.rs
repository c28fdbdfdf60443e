//! Fabrique compiler executable.
//!
//! Drives the compilation pipeline: parse the root fabfile, evaluate it
//! into a build graph, and emit the graph in one or more output formats.
//!
//! # Usage
//!
//! ```text
//! fabc [--format=ninja|dot|make|sh] [--output=DIR] [--print-dag] \
//!      [-D name=value] fabfile [name=value ...]
//! ```
//!
//! Command-line definitions (`name=value`) are exposed to the build
//! description as fields of the `args` record. Errors are reported with
//! source context via miette and exit status 1.

use std::process::exit;

use libfabrique::backend::Format;
use libfabrique::dag::{Value, ValueMap, ValueRef};
use libfabrique::error::FabError;
use libfabrique::file::SourceFile;
use libfabrique::nom_tools::{SpanInfo, State};
use libfabrique::types::TypeContext;
use libfabrique::{evaluate, parse_source, EvalOptions, Regeneration};

use log::LevelFilter;
use simplelog::{ColorChoice, CombinedLogger, ConfigBuilder, LevelPadding, TermLogger, TerminalMode};

struct Options {
    formats: Vec<Format>,
    output: String,
    print_dag: bool,
    fabfile: String,
    definitions: Vec<(String, String)>,
}

fn usage(program: &str) -> ! {
    eprintln!(
        "Usage: {program} [--format=ninja|dot|make|sh] [--output=DIR] [--print-dag] \
         [-D name=value] fabfile [name=value ...]"
    );
    exit(1);
}

fn parse_options(args: &[String]) -> Options {
    let program = args.first().map(String::as_str).unwrap_or("fabc");

    let mut formats = Vec::new();
    let mut output = ".".to_string();
    let mut print_dag = false;
    let mut fabfile = None;
    let mut definitions = Vec::new();

    let mut iter = args[1..].iter().peekable();
    while let Some(arg) = iter.next() {
        if let Some(format) = arg.strip_prefix("--format=") {
            match Format::by_name(format) {
                Some(format) => formats.push(format),
                None => {
                    eprintln!("unknown format '{format}'");
                    usage(program);
                }
            }
        } else if let Some(dir) = arg.strip_prefix("--output=") {
            output = dir.to_string();
        } else if arg == "--print-dag" {
            print_dag = true;
        } else if arg == "-D" {
            match iter.next().and_then(|d| d.split_once('=')) {
                Some((name, value)) => definitions.push((name.to_string(), value.to_string())),
                None => usage(program),
            }
        } else if arg.starts_with("--") {
            usage(program);
        } else if let Some((name, value)) = arg.split_once('=') {
            if fabfile.is_some() {
                definitions.push((name.to_string(), value.to_string()));
            } else {
                usage(program);
            }
        } else if fabfile.is_none() {
            fabfile = Some(arg.clone());
        } else {
            usage(program);
        }
    }

    let Some(fabfile) = fabfile else {
        usage(program);
    };

    if formats.is_empty() {
        formats.push(Format::Ninja);
    }

    Options {
        formats,
        output,
        print_dag,
        fabfile,
        definitions,
    }
}

/// Turns a `name=value` definition into a Fabrique value: booleans and
/// integers are recognized, everything else is a string.
fn definition_value(types: &mut TypeContext, raw: &str) -> ValueRef {
    match raw {
        "true" => Value::boolean(true, types, SpanInfo::none()),
        "false" => Value::boolean(false, types, SpanInfo::none()),
        _ => match raw.parse::<i64>() {
            Ok(number) => Value::integer(number, types, SpanInfo::none()),
            Err(_) => Value::string(raw, types, SpanInfo::none()),
        },
    }
}

fn report(error: FabError) -> ! {
    eprintln!("{:?}", miette::Report::new(error));
    exit(1);
}

fn main() {
    let config = ConfigBuilder::new()
        .set_location_level(LevelFilter::Error)
        .set_level_padding(LevelPadding::Off)
        .set_thread_level(LevelFilter::Off)
        .build();
    CombinedLogger::init(vec![TermLogger::new(
        LevelFilter::Warn,
        config,
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )])
    .unwrap();

    let args: Vec<String> = std::env::args().collect();
    let options = parse_options(&args);

    let content = match std::fs::read_to_string(&options.fabfile) {
        Ok(content) => content,
        Err(error) => {
            eprintln!("Error reading {}: {error}", options.fabfile);
            exit(1);
        }
    };

    let state = State::new(SourceFile::new(options.fabfile.clone(), content));
    let ast = match parse_source(&state) {
        Ok(ast) => ast,
        Err(error) => report(error),
    };

    let mut types = TypeContext::new();

    let mut arguments = ValueMap::new();
    for (name, value) in &options.definitions {
        let value = definition_value(&mut types, value);
        arguments.insert(name.clone(), value);
    }

    // The source root is the directory containing the root fabfile.
    let srcroot = std::path::Path::new(&options.fabfile)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .and_then(|p| p.canonicalize().ok())
        .or_else(|| std::env::current_dir().ok())
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| ".".to_string());

    let outputs: Vec<String> = options
        .formats
        .iter()
        .map(|format| format.default_filename().to_string())
        .collect();

    let eval_options = EvalOptions {
        srcroot,
        buildroot: options.output.clone(),
        arguments,
        regeneration: Some(Regeneration {
            command: args.join(" "),
            outputs: outputs.clone(),
        }),
        ..EvalOptions::default()
    };

    let dag = match evaluate(&ast, &mut types, eval_options) {
        Ok(dag) => dag,
        Err(error) => report(error),
    };

    if options.print_dag {
        print!("{}", dag.pretty_print(&types));
    }

    if let Err(error) = std::fs::create_dir_all(&options.output) {
        eprintln!("Error creating output directory {}: {error}", options.output);
        exit(1);
    }

    for (format, filename) in options.formats.iter().zip(&outputs) {
        let path = std::path::Path::new(&options.output).join(filename);
        let mut file = match std::fs::File::create(&path) {
            Ok(file) => file,
            Err(error) => {
                eprintln!("Error creating {}: {error}", path.display());
                exit(1);
            }
        };

        if let Err(error) = format.format(&dag, &types, &mut file) {
            eprintln!("Error writing {}: {error}", path.display());
            exit(1);
        }

        log::info!("wrote {}", path.display());
    }
}
