use std::env;
use std::io::{self, BufRead};
use std::process;
use std::thread;

use getopts::Options;
use log::{error, info, warn};

use stream_printer::config_parser;
use stream_printer::events::{EventRouter, Gift};
use stream_printer::logging;
use stream_printer::printer_config::Config;
use stream_printer::serial_link::SerialTransport;
use stream_printer::simulator::SimulatedTransport;
use stream_printer::transport::Transport;
use stream_printer::{Error, Printer, Result};

fn usage(prg: &str, opts: Options)
{
    let brief = format!("Usage: {} [options] -c CONFIG\n\n\
                         Reads events from stdin, one per line:\n  \
                         gift NAME DIAMONDS [COUNT]\n  \
                         quit\n  \
                         anything else is treated as a chat comment", prg);
    print!("{}", opts.usage(&brief));
}

fn open_transport(config: &Config) -> Result<Box<dyn Transport>>
{
    if config.simulation.enabled {
        info!("Using simulated printer");
        Ok(Box::new(SimulatedTransport::new(&config.simulation)))
    } else {
        let link = SerialTransport::open(&config.printer.candidate_ports(),
                                         config.printer.baud_rate,
                                         config.printer.response_timeout())?;
        Ok(Box::new(link))
    }
}

// gift NAME DIAMONDS [COUNT]
fn parse_gift(args: &[&str]) -> Option<Gift>
{
    let name = args.first()?;
    let diamond_count = args.get(1)?.parse().ok()?;
    let repeat_count = match args.get(2) {
        Some(c) => Some(c.parse().ok()?),
        None => None
    };
    Some(Gift { name: name.to_string(), diamond_count, repeat_count,
                streakable: false, streaking: false })
}

fn read_events(router: &EventRouter)
{
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to read event: {}", e);
                break;
            }
        };
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.first() {
            None => {},
            Some(&"quit") => break,
            Some(&"gift") => match parse_gift(&words[1..]) {
                Some(gift) => {
                    router.on_gift("console", &gift);
                },
                None => warn!("Invalid gift: {}", line)
            },
            Some(_) => {
                router.on_comment("console", &line);
            }
        }
    }
}

fn run(config: Config) -> Result<()>
{
    let transport = open_transport(&config)?;
    let mut printer = Printer::new(config.printer.clone(), transport);
    printer.setup()?;

    let handle = printer.handle();
    let worker = thread::Builder::new()
        .name(String::from("printer"))
        .spawn(move || {
            printer.run();
            printer
        })?;

    let router = EventRouter::new(handle.clone(), config.events.gift_to_filament_ratio);
    read_events(&router);

    info!("Shutting down printer controller");
    handle.stop();
    match worker.join() {
        Ok(mut printer) => printer.shutdown(),
        Err(_) => Err(Error::WorkerPanicked)
    }
}

fn main()
{
    let args: Vec<String> = env::args().collect();
    let program = args[0].clone();
    let mut opts = Options::new();
    opts.optopt("c", "config", "configuration file", "FILE");
    opts.optopt("d", "device", "serial device, overrides the configuration", "DEV");
    opts.optflag("s", "simulate", "use the simulated printer");
    opts.optflag("h", "help", "print this help menu");

    let matches = match opts.parse(&args[1..]) {
        Ok(m) => m,
        Err(f) => {
            eprintln!("{}", f);
            process::exit(2);
        }
    };
    if matches.opt_present("h") {
        usage(&program, opts);
        return;
    }

    let config_file = match matches.opt_str("config") {
        Some(f) => f,
        None => {
            eprintln!("No configuration file");
            usage(&program, opts);
            process::exit(2);
        }
    };

    let mut config = match config_parser::read_config(&config_file) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };
    if let Some(dev) = matches.opt_str("device") {
        config.printer.port = dev;
        config.printer.fallback_ports.clear();
    }
    if matches.opt_present("simulate") {
        config.simulation.enabled = true;
    }

    if let Err(e) = logging::init(&config.logging) {
        eprintln!("{}", e);
        process::exit(1);
    }

    if let Err(e) = run(config) {
        error!("{}", e);
        process::exit(1);
    }
}
