use std::path::PathBuf;

use ccx_vtk::{ConvertOptions, OutputFormat};

/// Log verbosity selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

impl Verbosity {
    /// Default filter directive when `RUST_LOG` is unset
    pub fn default_directive(self) -> &'static str {
        match self {
            Verbosity::Quiet => "warn",
            Verbosity::Normal => "info",
            Verbosity::Verbose => "debug",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Convert(Args),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Args {
    pub input: PathBuf,
    pub options: ConvertOptions,
    pub json: bool,
    pub verbosity: Verbosity,
}

/// Parse arguments after the program name
pub fn parse_args<I>(args: I) -> Result<Command, String>
where
    I: IntoIterator<Item = String>,
{
    let mut positional = Vec::new();
    let mut output_dir = None;
    let mut derived_fields = true;
    let mut json = false;
    let mut verbosity = Verbosity::Normal;

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "-o" | "--output-dir" => {
                let dir = args
                    .next()
                    .ok_or_else(|| format!("{arg} requires a directory"))?;
                output_dir = Some(PathBuf::from(dir));
            }
            "--no-derived" => derived_fields = false,
            "--json" => json = true,
            "-q" | "--quiet" => verbosity = Verbosity::Quiet,
            "-v" | "--verbose" => verbosity = Verbosity::Verbose,
            flag if flag.starts_with('-') && flag.len() > 1 => {
                return Err(format!("unknown option {flag}"));
            }
            _ => positional.push(arg),
        }
    }

    let [input, format] = <[String; 2]>::try_from(positional)
        .map_err(|p| format!("expected <input.frd> <format>, got {} arguments", p.len()))?;
    let format: OutputFormat = format.parse().map_err(|err| format!("{err}"))?;

    Ok(Command::Convert(Args {
        input: PathBuf::from(input),
        options: ConvertOptions {
            format,
            output_dir,
            derived_fields,
        },
        json,
        verbosity,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Command, String> {
        parse_args(args.iter().map(|a| a.to_string()))
    }

    fn convert(args: &[&str]) -> Args {
        match parse(args).expect("arguments should parse") {
            Command::Convert(args) => args,
            Command::Help => panic!("expected a conversion"),
        }
    }

    #[test]
    fn parses_input_and_format() {
        let args = convert(&["job.frd", "vtu"]);
        assert_eq!(args.input, PathBuf::from("job.frd"));
        assert_eq!(args.options, ConvertOptions::new(OutputFormat::Vtu));
        assert!(!args.json);
        assert_eq!(args.verbosity, Verbosity::Normal);
    }

    #[test]
    fn parses_options_in_any_position() {
        let args = convert(&["--json", "job.frd", "-o", "out", "VTK", "--no-derived", "-q"]);
        assert_eq!(args.options.format, OutputFormat::Vtk);
        assert_eq!(args.options.output_dir, Some(PathBuf::from("out")));
        assert!(!args.options.derived_fields);
        assert!(args.json);
        assert_eq!(args.verbosity.default_directive(), "warn");
    }

    #[test]
    fn rejects_unknown_format() {
        let err = parse(&["job.frd", "xdmf"]).expect_err("xdmf is not a format");
        assert!(err.contains("xdmf"));
    }

    #[test]
    fn rejects_wrong_argument_count() {
        assert!(parse(&["job.frd"]).is_err());
        assert!(parse(&["job.frd", "vtk", "extra"]).is_err());
        assert!(parse(&["job.frd", "vtk", "--output-dir"]).is_err());
        assert!(parse(&["job.frd", "vtk", "--fast"]).is_err());
    }

    #[test]
    fn help_wins() {
        assert_eq!(parse(&["job.frd", "--help"]), Ok(Command::Help));
    }
}
