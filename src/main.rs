//! `ewmhctl` reads and writes EWMH/ICCCM window properties and sends requests to EWMH compatible
//! window managers. It is a thin command line front end to `ewmh-client` and mostly useful to
//! inspect what a window manager publishes and how it reacts to client messages.
//!
//! ## Command line examples
//!
//! ### Inspect the window manager
//! ```bash
//! ewmhctl info
//! ```
//!
//! ### Read a property
//! Read the desktop layout of the root window, requiring it to be of type CARDINAL.
//! ```bash
//! ewmhctl get _NET_DESKTOP_LAYOUT --type CARDINAL
//! ```
//!
//! ### Rename a window
//! ```bash
//! ewmhctl set-text _NET_WM_NAME "scratch" --window 0x04000007
//! ```
//!
//! ### Switch desktop
//! Ask the window manager to switch to the second desktop.
//! ```bash
//! ewmhctl send _NET_CURRENT_DESKTOP 1 0
//! ```
use anyhow::{Context, Result};
use clap::{crate_description, crate_version, Arg, ArgAction, ArgMatches, Command};
use ewmh_client::prelude::*;
use gory::*;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    let window = Arg::new("window")
        .long("window")
        .short('w')
        .value_name("ID")
        .value_parser(parse_id)
        .help("Window id, decimal or 0x prefixed hex, defaults to the root window");
    let type_ = Arg::new("type")
        .long("type")
        .short('t')
        .value_name("TYPE")
        .help("Property type to require, any type is accepted by default");

    Command::new("ewmhctl")
        .about(crate_description!())
        .subcommand_required(true)
        .arg_required_else_help(true)
        .version(crate_version!())
        .arg(
            Arg::new("display")
                .long("display")
                .short('d')
                .global(true)
                .value_name("DISPLAY")
                .help("X11 display to connect to, defaults to $DISPLAY"),
        )
        .arg(
            Arg::new("screen")
                .long("screen")
                .short('s')
                .global(true)
                .value_name("SCREEN")
                .value_parser(clap::value_parser!(usize))
                .help("Screen number, defaults to the one selected by the display"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::Count)
                .help("Log requests, repeat for more detail. RUST_LOG takes precedence"),
        )
        .subcommand(Command::new("info").visible_alias("i").about("Show what the window manager publishes"))
        .subcommand(Command::new("list").visible_alias("l").about("List the managed windows"))
        .subcommand(
            Command::new("get")
                .visible_alias("g")
                .about("Read a property")
                .arg(Arg::new("NAME").required(true).help("Property name"))
                .arg(type_.clone())
                .arg(window.clone()),
        )
        .subcommand(
            Command::new("get-text")
                .about("Read a text property")
                .arg(Arg::new("NAME").required(true).help("Property name"))
                .arg(type_)
                .arg(window.clone())
                .arg(
                    Arg::new("replace")
                        .long("replace")
                        .action(ArgAction::SetTrue)
                        .help("Replace undecodable bytes instead of failing"),
                ),
        )
        .subcommand(
            Command::new("set-text")
                .about("Write a text property")
                .arg(Arg::new("NAME").required(true).help("Property name"))
                .arg(Arg::new("TEXT").required(true).help("Text to write"))
                .arg(
                    Arg::new("type")
                        .long("type")
                        .short('t')
                        .value_name("TYPE")
                        .default_value("UTF8_STRING")
                        .help("STRING or UTF8_STRING"),
                )
                .arg(window.clone()),
        )
        .subcommand(
            Command::new("send")
                .about("Send a client message to the window manager")
                .arg(Arg::new("NAME").required(true).help("Message type"))
                .arg(
                    Arg::new("DATA")
                        .num_args(0..)
                        .value_parser(parse_id)
                        .help("Up to 5 values, decimal or 0x prefixed hex"),
                )
                .arg(window),
        )
}

// Parse a window id or message value, X tools print them in hex
fn parse_id(val: &str) -> Result<u32, String> {
    let parsed = match val.strip_prefix("0x").or_else(|| val.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => val.parse::<u32>(),
    };
    parsed.map_err(|e| format!("invalid id {}: {}", val, e))
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn target(ewmh: &Ewmh, matches: &ArgMatches) -> Window {
    match matches.get_one::<u32>("window") {
        Some(id) => ewmh.window(*id),
        None => ewmh.root().clone(),
    }
}

fn expected_type<'a>(matches: &'a ArgMatches) -> AtomSpec<'a> {
    match matches.get_one::<String>("type") {
        Some(name) => AtomSpec::from(name),
        None => AtomSpec::Id(ANY_PROPERTY_TYPE),
    }
}

// Print a hint, or why it couldn't be read
fn show<T>(label: &str, value: EwmhResult<T>, fmt: impl Fn(T) -> String) {
    match value {
        Ok(value) => println!("{:<20}{}", format!("{}:", label), fmt(value)),
        Err(err) => println!("{:<20}{}", format!("{}:", label), err.to_string().as_str().red()),
    }
}

fn info(ewmh: &Ewmh) {
    println!("{}", "X11 Information".cyan());
    println!("{:-<72}", "");
    show("Display", Ok(ewmh.root().display_name().to_owned()), |v| v);
    show("Screen", Ok(ewmh.screen()), |v| v.to_string());
    show("Root Window", Ok(ewmh.root().to_string()), |v| v);
    show("Window Manager", ewmh.supporting_wm_check().and_then(|w| w.wm_name()), |v| v);
    show("Desktops", ewmh.number_of_desktops(), |v| v.to_string());
    show("Current Desktop", ewmh.current_desktop(), |v| v.to_string());
    show("Desktop Names", ewmh.desktop_names(), |v| v.join(", "));
    show("Desktop Geometry", ewmh.desktop_geometry(), |(w, h)| format!("{}x{}", w, h));
    show("Desktop Viewport", ewmh.desktop_viewport(), |v| format!("{:?}", v));
    show("Desktop Layout", ewmh.desktop_layout(), |v| v.to_string());
    show("Showing Desktop", ewmh.showing_desktop(), |v| v.to_string());
    show("Work Area", ewmh.workarea(), |v| {
        v.iter().map(|a| format!("[{}]", a)).collect::<Vec<_>>().join(" ")
    });
    show("Active Window", ewmh.active_window(), |v| v.map(|w| w.to_string()).unwrap_or_else(|| "none".into()));
    show("Supported", ewmh.supported(), |v| v.len().to_string());
}

fn list(ewmh: &Ewmh) -> Result<()> {
    let active = ewmh.active_window().ok().flatten();
    let clients = ewmh.client_list().context("failed to read the client list")?;
    println!("{:<12} {:<1} {}", "ID".cyan(), "", "NAME".cyan());
    for win in clients {
        let mark = if Some(&win) == active.as_ref() { "*" } else { " " };
        let name = win.wm_name().unwrap_or_default();
        println!("{:<12} {:<1} {}", win.to_string(), mark, name);
    }
    Ok(())
}

fn format_value(ewmh: &Ewmh, prop: &Property) -> String {
    let is = |atom: AtomEnum| prop.type_().map_or(false, |t| t.has_id(atom.into()));
    match prop.value() {
        PropertyValue::Bytes(bytes) => format!("{:?}", String::from_utf8_lossy(bytes)),
        PropertyValue::Words16(words) => words.iter().map(u16::to_string).collect::<Vec<_>>().join(", "),
        PropertyValue::Words32(words) if is(AtomEnum::ATOM) => words
            .iter()
            .map(|id| match ewmh.root().atom(*id, false).and_then(|a| a.name().map(str::to_owned)) {
                Ok(name) => name,
                Err(_) => format!("#{}", id),
            })
            .collect::<Vec<_>>()
            .join(", "),
        PropertyValue::Words32(words) if is(AtomEnum::WINDOW) => {
            words.iter().map(|id| ewmh.window(*id).to_string()).collect::<Vec<_>>().join(", ")
        },
        PropertyValue::Words32(words) => words.iter().map(u32::to_string).collect::<Vec<_>>().join(", "),
    }
}

fn get(ewmh: &Ewmh, matches: &ArgMatches) -> Result<()> {
    let name = matches.get_one::<String>("NAME").context("missing property name")?;
    let win = target(ewmh, matches);
    let prop = win
        .get_full_property(name, expected_type(matches))
        .with_context(|| format!("failed to read {} on {}", name, win))?;
    match prop.type_() {
        Some(type_) => {
            let type_name = type_.name().map(str::to_owned).unwrap_or_else(|_| type_.to_string());
            println!("{}({}/{}) = {}", name.cyan(), type_name, prop.format(), format_value(ewmh, &prop));
        },
        None => println!("{}: {}", name.cyan(), "not found".red()),
    }
    Ok(())
}

fn get_text(ewmh: &Ewmh, matches: &ArgMatches) -> Result<()> {
    let name = matches.get_one::<String>("NAME").context("missing property name")?;
    let errors = if matches.get_flag("replace") { TextErrors::Replace } else { TextErrors::Strict };
    let win = target(ewmh, matches);
    let text = win
        .get_text(name, expected_type(matches), None, errors)
        .with_context(|| format!("failed to read {} on {}", name, win))?;
    println!("{}", text);
    Ok(())
}

fn set_text(ewmh: &Ewmh, matches: &ArgMatches) -> Result<()> {
    let name = matches.get_one::<String>("NAME").context("missing property name")?;
    let text = matches.get_one::<String>("TEXT").context("missing text")?;
    let type_ = matches.get_one::<String>("type").context("missing property type")?;
    let win = target(ewmh, matches);
    win.set_text(name, text, type_, None, TextErrors::Strict, Mode::Replace, true)
        .and_then(PendingWrite::check)
        .with_context(|| format!("failed to write {} on {}", name, win))?;
    debug!("set-text: {} on {}", name, win);
    Ok(())
}

fn send(ewmh: &Ewmh, matches: &ArgMatches) -> Result<()> {
    let name = matches.get_one::<String>("NAME").context("missing message type")?;
    let data: Vec<u32> = matches.get_many::<u32>("DATA").map(|v| v.copied().collect()).unwrap_or_default();
    let win = target(ewmh, matches);
    win.send_message(name, &data).with_context(|| format!("failed to send {} about {}", name, win))?;
    debug!("send: {} about {}: {:?}", name, win, data);
    Ok(())
}

fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_logging(matches.get_count("verbose"));

    let display = matches.get_one::<String>("display").map(String::as_str);
    let screen = matches.get_one::<usize>("screen").copied();
    let ewmh = Ewmh::connect(display, screen).context("failed to connect to the X11 server")?;

    match matches.subcommand() {
        Some(("info", _)) => {
            info(&ewmh);
            Ok(())
        },
        Some(("list", _)) => list(&ewmh),
        Some(("get", sub)) => get(&ewmh, sub),
        Some(("get-text", sub)) => get_text(&ewmh, sub),
        Some(("set-text", sub)) => set_text(&ewmh, sub),
        Some(("send", sub)) => send(&ewmh, sub),
        _ => unreachable!(),
    }
}
