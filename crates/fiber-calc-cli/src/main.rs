//! Fiber Calculator CLI
//!
//! Runs the optical toolbox calculators from the command line.
//!
//! Usage:
//!   fibercalc na-refractive --n1 1.50 --n2 1.48
//!   fibercalc v-number --core-radius 4.5 --wavelength 1310 --na 0.12
//!   fibercalc link-budget --tx-power 3 --rx-sensitivity -28 --json
//!
//! Fields left out take the value the calculator form resets to.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use fiber_calc::{evaluate_with, Calculator, EvalConfig, Fields, Mode, Readout};
use serde_json::json;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(
    name = "fibercalc",
    about = "Fiber-optic engineering calculators (NA, V-number, dispersion, dBm/mW, link budget)"
)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List calculators, their modes and form defaults
    List,

    /// Numerical aperture from core and cladding indices
    NaRefractive {
        /// Core refractive index
        #[arg(long, default_value = "1.50", allow_hyphen_values = true)]
        n1: String,
        /// Cladding refractive index
        #[arg(long, default_value = "1.48", allow_hyphen_values = true)]
        n2: String,
    },

    /// Numerical aperture from spot diameter and distance
    NaDiameter {
        /// Spot diameter
        #[arg(short = 'd', long, default_value = "25.4", allow_hyphen_values = true)]
        diameter: String,
        /// Diameter unit (mm, cm, m, in)
        #[arg(long, default_value = "mm")]
        diameter_unit: String,
        /// Distance from fiber end to the spot
        #[arg(short = 'l', long, default_value = "100", allow_hyphen_values = true)]
        distance: String,
        /// Distance unit (mm, cm, m, in)
        #[arg(long, default_value = "mm")]
        distance_unit: String,
    },

    /// V-number and mode count
    VNumber {
        /// Core radius in µm
        #[arg(short = 'a', long, allow_hyphen_values = true)]
        core_radius: String,
        /// Wavelength in nm
        #[arg(long, allow_hyphen_values = true)]
        wavelength: String,
        /// Numerical aperture
        #[arg(long, allow_hyphen_values = true)]
        na: String,
    },

    /// Pulse spreading and maximum bit rate
    Dispersion {
        /// Dispersion coefficient in ps/(nm·km)
        #[arg(short = 'D', long, allow_hyphen_values = true)]
        coefficient: String,
        /// Fiber length in km
        #[arg(short = 'L', long, allow_hyphen_values = true)]
        length: String,
        /// Source spectral width in nm
        #[arg(long, allow_hyphen_values = true)]
        spectral_width: String,
    },

    /// Convert dBm to mW
    DbmToMw {
        #[arg(default_value = "10", allow_hyphen_values = true)]
        dbm: String,
    },

    /// Convert mW to dBm
    MwToDbm {
        #[arg(default_value = "10", allow_hyphen_values = true)]
        mw: String,
    },

    /// Fiber link power budget
    LinkBudget {
        /// Transmitter power in dBm
        #[arg(long, default_value = "3", allow_hyphen_values = true)]
        tx_power: String,
        /// Receiver sensitivity in dBm
        #[arg(long, default_value = "-28", allow_hyphen_values = true)]
        rx_sensitivity: String,
        /// Fiber length in km
        #[arg(long, default_value = "10", allow_hyphen_values = true)]
        fiber_length: String,
        /// Fiber attenuation in dB/km
        #[arg(long, default_value = "0.35", allow_hyphen_values = true)]
        loss_per_km: String,
        /// Total connector loss in dB
        #[arg(long, default_value = "0.5", allow_hyphen_values = true)]
        connector_loss: String,
        /// Total splice loss in dB
        #[arg(long, default_value = "0.1", allow_hyphen_values = true)]
        splice_loss: String,
        /// Splitter loss in dB
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        splitter_loss: String,
        /// Reject unparsed fields and negative losses instead of reading them as 0
        #[arg(long)]
        strict: bool,
    },
}

/// A calculator run: the mode, its raw fields and evaluation switches
#[derive(Debug)]
struct Request {
    mode: Mode,
    fields: Fields,
    config: EvalConfig,
}

impl Request {
    fn new(mode: Mode, pairs: Vec<(&str, String)>) -> Self {
        Self {
            mode,
            fields: pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
            config: EvalConfig::default(),
        }
    }
}

impl Command {
    /// `None` for commands that don't run a calculator
    fn into_request(self) -> Option<Request> {
        let request = match self {
            Command::List => return None,
            Command::NaRefractive { n1, n2 } => {
                Request::new(Mode::NaRefractive, vec![("n1", n1), ("n2", n2)])
            }
            Command::NaDiameter {
                diameter,
                diameter_unit,
                distance,
                distance_unit,
            } => Request::new(
                Mode::NaDiameter,
                vec![
                    ("diameter", diameter),
                    ("diameter_unit", diameter_unit),
                    ("distance", distance),
                    ("distance_unit", distance_unit),
                ],
            ),
            Command::VNumber {
                core_radius,
                wavelength,
                na,
            } => Request::new(
                Mode::VNumber,
                vec![
                    ("core_radius_um", core_radius),
                    ("wavelength_nm", wavelength),
                    ("na", na),
                ],
            ),
            Command::Dispersion {
                coefficient,
                length,
                spectral_width,
            } => Request::new(
                Mode::Dispersion,
                vec![
                    ("coefficient", coefficient),
                    ("length_km", length),
                    ("spectral_width_nm", spectral_width),
                ],
            ),
            Command::DbmToMw { dbm } => Request::new(Mode::DbmToMw, vec![("dbm", dbm)]),
            Command::MwToDbm { mw } => Request::new(Mode::MwToDbm, vec![("mw", mw)]),
            Command::LinkBudget {
                tx_power,
                rx_sensitivity,
                fiber_length,
                loss_per_km,
                connector_loss,
                splice_loss,
                splitter_loss,
                strict,
            } => {
                let mut request = Request::new(
                    Mode::LinkBudget,
                    vec![
                        ("tx_power_dbm", tx_power),
                        ("rx_sensitivity_dbm", rx_sensitivity),
                        ("fiber_length_km", fiber_length),
                        ("loss_per_km_db", loss_per_km),
                        ("connector_loss_db", connector_loss),
                        ("splice_loss_db", splice_loss),
                        ("splitter_loss_db", splitter_loss),
                    ],
                );
                request.config.strict_link_budget = strict;
                request
            }
        };
        Some(request)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging (stderr keeps stdout clean for --json)
    let level = if args.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let Some(request) = args.command.into_request() else {
        print_registry(args.json)?;
        return Ok(());
    };

    debug!("Evaluating {} with {:?}", request.mode, request.fields);
    let readout = evaluate_with(request.mode, &request.fields, &request.config)
        .with_context(|| format!("{} calculation failed", request.mode))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&readout)?);
    } else {
        print_readout(&readout);
    }

    Ok(())
}

fn print_readout(readout: &Readout) {
    println!("{}", readout.mode.calculator().title());
    println!("{}", "-".repeat(40));
    let width = readout
        .entries
        .iter()
        .map(|e| e.label.chars().count())
        .max()
        .unwrap_or(0);
    for entry in &readout.entries {
        let pad = width - entry.label.chars().count();
        println!("  {}{} : {}", entry.label, " ".repeat(pad), entry.value);
    }
}

fn print_registry(as_json: bool) -> Result<()> {
    if as_json {
        let calculators: Vec<_> = Calculator::ALL
            .iter()
            .map(|c| {
                json!({
                    "page_id": c.page_id(),
                    "title": c.title(),
                    "modes": c.modes().iter().map(|m| json!({
                        "mode": m,
                        "fields": m.fields(),
                    })).collect::<Vec<_>>(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&calculators)?);
        return Ok(());
    }

    let cli = Args::command();
    for calc in Calculator::ALL {
        println!("{} ({})", calc.title(), calc.page_id());
        for mode in calc.modes() {
            println!("  {}", mode);
            for line in argument_lines(&cli, *mode) {
                println!("    {}", line);
            }
        }
    }
    Ok(())
}

/// Usage lines for the arguments of `mode`'s subcommand, as clap spells them
fn argument_lines(cli: &clap::Command, mode: Mode) -> Vec<String> {
    let Some(sub) = cli.find_subcommand(mode.code()) else {
        return Vec::new();
    };

    sub.get_arguments()
        .filter(|arg| !arg.is_global_set() && arg.get_id().as_str() != "help")
        .map(|arg| {
            let name = match arg.get_long() {
                Some(long) => format!("--{}", long),
                None => format!("<{}>", arg.get_id().as_str().to_uppercase()),
            };
            let help = arg.get_help().map(|h| h.to_string()).unwrap_or_default();
            let default = if !arg.get_action().takes_values() {
                "flag".to_string()
            } else if arg.get_default_values().is_empty() {
                "required".to_string()
            } else {
                let values: Vec<_> = arg
                    .get_default_values()
                    .iter()
                    .map(|v| v.to_string_lossy())
                    .collect();
                format!("default: {}", values.join(","))
            };
            format!("{:<20} {} [{}]", name, help, default)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(argv: &[&str]) -> Option<Request> {
        Args::try_parse_from(argv).unwrap().command.into_request()
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let req = request(&["fibercalc", "na-refractive"]).unwrap();
        assert_eq!(req.mode, Mode::NaRefractive);
        assert_eq!(req.fields["n1"], "1.50");
        assert_eq!(req.fields["n2"], "1.48");
    }

    #[test]
    fn test_negative_values_accepted() {
        let req = request(&[
            "fibercalc",
            "link-budget",
            "--rx-sensitivity",
            "-30",
            "--strict",
        ])
        .unwrap();
        assert_eq!(req.fields["rx_sensitivity_dbm"], "-30");
        assert!(req.config.strict_link_budget);

        let req = request(&["fibercalc", "dbm-to-mw", "-3"]).unwrap();
        assert_eq!(req.fields["dbm"], "-3");
    }

    #[test]
    fn test_cli_defaults_match_form_defaults() {
        for (argv, mode) in [
            (vec!["fibercalc", "na-refractive"], Mode::NaRefractive),
            (vec!["fibercalc", "na-diameter"], Mode::NaDiameter),
            (vec!["fibercalc", "dbm-to-mw"], Mode::DbmToMw),
            (vec!["fibercalc", "mw-to-dbm"], Mode::MwToDbm),
            (vec!["fibercalc", "link-budget"], Mode::LinkBudget),
        ] {
            let req = request(&argv).unwrap();
            assert_eq!(req.fields, mode.defaults(), "{}", mode);
        }
    }

    #[test]
    fn test_v_number_requires_fields() {
        assert!(Args::try_parse_from(["fibercalc", "v-number", "--na", "0.12"]).is_err());
        let req = request(&[
            "fibercalc", "v-number", "-a", "4.5", "--wavelength", "1310", "--na", "0.12",
        ])
        .unwrap();
        let readout = evaluate_with(req.mode, &req.fields, &req.config).unwrap();
        assert_eq!(readout.get("fiber_type"), Some("Multi-mode"));
    }

    #[test]
    fn test_listed_flags_are_accepted() {
        let cli = Args::command();
        for mode in Mode::ALL {
            let lines = argument_lines(&cli, mode);
            assert!(!lines.is_empty(), "{}", mode);

            let mut argv = vec!["fibercalc".to_string(), mode.code().to_string()];
            for line in &lines {
                let name = line.split_whitespace().next().unwrap();
                if line.ends_with("[flag]") {
                    argv.push(name.to_string());
                } else if name.starts_with("--") {
                    argv.extend([name.to_string(), "1".to_string()]);
                } else {
                    argv.push("1".to_string());
                }
            }
            assert!(Args::try_parse_from(&argv).is_ok(), "{:?}", argv);
        }
    }

    #[test]
    fn test_listed_flags_use_cli_spelling() {
        let lines = argument_lines(&Args::command(), Mode::LinkBudget);
        assert!(lines.iter().any(|l| l.starts_with("--tx-power ")));
        assert!(lines.iter().any(|l| l.starts_with("--strict ") && l.ends_with("[flag]")));
        assert!(lines.iter().all(|l| !l.contains("tx_power_dbm")));

        let lines = argument_lines(&Args::command(), Mode::VNumber);
        assert!(lines.iter().any(|l| l.starts_with("--core-radius ") && l.ends_with("[required]")));

        let lines = argument_lines(&Args::command(), Mode::DbmToMw);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("<DBM>"));
    }

    #[test]
    fn test_list_runs_no_calculator() {
        assert!(request(&["fibercalc", "list", "--json"]).is_none());
    }
}
