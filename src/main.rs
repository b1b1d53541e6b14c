extern crate termion;
extern crate srs_backend as backend;
extern crate clap;
extern crate failure;
extern crate chrono;
extern crate itertools;
extern crate rand;

use std::io::{self, Write};
use std::collections::HashSet;
use std::{path, fs, fmt};

use failure::Error;
use termion::{color, style};
use itertools::Itertools;
use clap::{Arg, App};
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// The text that is printed when the `help` command is issued.
const HELP: &'static str = r#"wrong, w   : Grade the item as wrong
hard, h    : Grade the item as hard
right, r   : Grade the item as right
easy, e    : Grade the item as easy
info, i    : Print item info
preview, p : Print the next interval for every grade
dump, d    : Print all items as YAML
help, he   : Print this help page
quit, q    : Quit the program"#;

/// Formatter for intervals.
struct DurationFormatter(backend::Interval);

impl fmt::Display for DurationFormatter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut duration = chrono::Duration::seconds(self.0);

        if duration.is_zero() {
            // If the duration is empty, simply write an unitless 0.
            return write!(f, "0");
        }

        // Break the duration into units.
        let years = duration.num_weeks() / 4 / 12;
        duration = duration - chrono::Duration::weeks(years * 4 * 12);
        let months = duration.num_weeks() / 4;
        duration = duration - chrono::Duration::weeks(months * 4);
        let weeks = duration.num_weeks();
        duration = duration - chrono::Duration::weeks(weeks);
        let days = duration.num_days();
        duration = duration - chrono::Duration::days(days);
        let hours = duration.num_hours();
        duration = duration - chrono::Duration::hours(hours);
        let minutes = duration.num_minutes();
        duration = duration - chrono::Duration::minutes(minutes);
        let seconds = duration.num_seconds();

        // Write non-zero parts.
        let parts = [(years, "y"), (months, "M"), (weeks, "w"), (days, "d"), (hours, "h"), (minutes, "m"), (seconds, "s")];
        write!(f, "{}", parts.iter().filter(|(n, _)| *n != 0).map(|(n, unit)| format!("{}{}", n, unit)).format(" "))
    }
}

/// Formatter for points in time.
struct TimeFormatter(backend::Time);

impl fmt::Display for TimeFormatter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match chrono::NaiveDateTime::from_timestamp_opt(self.0, 0) {
            Some(time) => write!(f, "{} UTC", time.format("%Y-%m-%d %H:%M:%S")),
            None => write!(f, "{}", self.0),
        }
    }
}

/// The clock of the shell.
enum Clock {
    /// The wall clock.
    System,
    /// A fixed point in time, given on the command line.
    Fixed(backend::Time),
}

impl Clock {
    fn now(&self) -> backend::Time {
        match *self {
            Clock::System => backend::now(),
            Clock::Fixed(time) => time,
        }
    }
}

/// State of application in "study" mode.
pub struct State<W: Write, R> {
    /// The interval scheduler.
    scheduler: backend::IntervalScheduler,
    /// The items to study.
    queue: backend::Queue,
    /// The ID of the current item and its next interval for every grade, if anything is due.
    ///
    /// The intervals are computed once, such that the interval shown is the one applied.
    current: Option<(String, [backend::Interval; backend::GRADES])>,
    /// Items that cannot be scheduled, and are left out for the rest of the session.
    skipped: HashSet<String>,
    /// The clock.
    clock: Clock,
    /// The source of interval fuzz.
    rng: StdRng,
    /// Standard output.
    stdout: W,
    /// Standard input.
    stdin: io::Lines<R>,
}

impl<W: Write, R: io::BufRead> State<W, R> {
    /// Create a new `State`.
    fn new(stdout: W, stdin: R, scheduler: backend::IntervalScheduler, queue: backend::Queue, clock: Clock, rng: StdRng)
        -> State<W, R>
    {
        State {
            scheduler,
            queue,
            current: None,
            skipped: HashSet::new(),
            clock,
            rng,
            stdout,
            stdin: stdin.lines(),
        }
    }

    /// Run the program.
    pub fn run(mut self) -> Result<(), Error> {
        self.pick_item()?;
        self.print_shell()?;

        while let Some(line) = self.stdin.next() {
            if !self.command(&line?)? { break; };
            self.print_shell()?;
        }

        Ok(())
    }

    /// Print the shell, that is, the text before the command input.
    fn print_shell(&mut self) -> Result<(), Error> {
        write!(self.stdout, "D:{} T:{} {}>>{} ",
            self.queue.due_count(self.clock.now()),
            self.queue.len(),
            color::Fg(color::Red),
            color::Fg(color::Reset),
        )?;
        // Print it immediately.
        self.stdout.flush()?;
        Ok(())
    }

    /// Run command `command`.
    ///
    /// The returned boolean is false precisely when the program should quit.
    fn command(&mut self, command: &str) -> Result<bool, Error> {
        let command = command.trim();
        match command {
            "wrong" | "w" => self.review(backend::Grade::Wrong)?,
            "hard" | "h" => self.review(backend::Grade::Hard)?,
            "right" | "r" => self.review(backend::Grade::Right)?,
            "easy" | "e" => self.review(backend::Grade::Easy)?,
            "info" | "i" => self.print_info()?,
            "preview" | "p" => self.print_preview()?,
            "dump" | "d" => write!(self.stdout, "{}", self.queue.serialize()?)?,
            "help" | "he" => self.help()?,
            "quit" | "q" => return Ok(false),
            "" => (),
            _ => writeln!(self.stdout, "Unknown command '{}'.", command)?,
        }

        Ok(true)
    }

    /// Print a section header.
    fn print_header(&mut self, f: fmt::Arguments) -> Result<(), Error> {
        writeln!(self.stdout, "{}——— {} ———{}", style::Bold, f, style::Reset)?;
        Ok(())
    }

    fn help(&mut self) -> Result<(), Error> {
        self.print_header(format_args!("help"))?;
        writeln!(self.stdout, "{}", HELP)?;
        Ok(())
    }

    /// The current item, if any.
    fn current_item(&self) -> Option<&backend::Item> {
        self.current.as_ref().and_then(|(id, _)| self.queue.get(id))
    }

    /// Pick the next due item and show it.
    ///
    /// Items whose intervals cannot be computed are reported and skipped.
    fn pick_item(&mut self) -> Result<(), Error> {
        let now = self.clock.now();
        self.current = None;

        loop {
            let item = match self.queue.next_due_skipping(now, &self.skipped) {
                Some(item) => item.clone(),
                None => {
                    writeln!(self.stdout, "Nothing is due.")?;
                    return Ok(());
                },
            };

            let rng = &mut self.rng;
            match self.scheduler.preview(&item, now, || rng.gen::<f64>()) {
                Ok(intervals) => {
                    self.current = Some((item.id, intervals));
                    break;
                },
                Err(err) => {
                    warn!(item = %item.id, %err, "skipping item");
                    writeln!(self.stdout, "Skipping item '{}': {}.", item.id, err)?;
                    self.skipped.insert(item.id);
                },
            }
        }

        self.print_info()?;
        self.print_preview()
    }

    /// Grade the current item with `grade`.
    fn review(&mut self, grade: backend::Grade) -> Result<(), Error> {
        let now = self.clock.now();
        let (id, interval) = match self.current.take() {
            Some((id, intervals)) => (id, intervals[grade as usize - 1]),
            None => {
                writeln!(self.stdout, "Nothing is due.")?;
                return Ok(());
            },
        };

        if let Some(item) = self.queue.record(&id, grade, now, interval) {
            info!(item = %item.id, %grade, interval, "reviewed");
            if item.is_leech() {
                warn!(item = %item.id, wrong = item.consecutive_wrong, "item is a leech");
            }
        }
        writeln!(self.stdout, "{}: next review in {}.", grade, DurationFormatter(interval))?;

        self.pick_item()
    }

    /// Print item information.
    fn print_info(&mut self) -> Result<(), Error> {
        let item = match self.current_item() {
            Some(item) => item.clone(),
            None => return Ok(()),
        };
        let now = self.clock.now();

        self.print_header(format_args!("item '{}'", item.id))?;
        writeln!(self.stdout, "part:       {}", item.part)?;
        writeln!(self.stdout, "reviews:    {} ({} right)", item.reviews, item.successes)?;
        match item.last {
            Some(last) => {
                writeln!(self.stdout, "last:       {}", TimeFormatter(last))?;
                writeln!(self.stdout, "due:        {}", TimeFormatter(item.next))?;
                writeln!(self.stdout, "interval:   {}", DurationFormatter(item.interval))?;
                writeln!(self.stdout, "readiness:  {:.2}", item.readiness(now))?;
            },
            None => writeln!(self.stdout, "new item")?,
        }
        if item.is_leech() {
            writeln!(self.stdout, "{}leech{} (wrong {} times in a row)",
                color::Fg(color::Yellow), color::Fg(color::Reset), item.consecutive_wrong)?;
        }

        Ok(())
    }

    /// Print the next interval of the current item for every grade.
    fn print_preview(&mut self) -> Result<(), Error> {
        let intervals = match self.current {
            Some((_, intervals)) => intervals,
            None => return Ok(()),
        };

        self.print_header(format_args!("next intervals"))?;
        for (grade, interval) in backend::Grade::ALL.iter().zip(intervals.iter()) {
            writeln!(self.stdout, "{:<6} {}", format!("{}:", grade), DurationFormatter(*interval))?;
        }

        Ok(())
    }
}

/// Load the part settings.
///
/// Without a config file, the built-in settings are used.
fn load_config(config_path: Option<&path::Path>) -> Result<backend::ConfigStore, Error> {
    match config_path {
        Some(path) => {
            info!(path = %path.display(), "loading settings");
            Ok(backend::parse_config(&fs::read_to_string(path)?)?)
        },
        None => Ok(backend::ConfigStore::default()),
    }
}

/// Load the items to study.
fn load_queue(items_path: &path::Path) -> Result<backend::Queue, Error> {
    let queue = backend::Queue::parse(&fs::read_to_string(items_path)?)?;
    info!(path = %items_path.display(), items = queue.len(), "loaded items");
    Ok(queue)
}

/// Start srs.
fn main_err() -> Result<(), Error> {
    let matches = App::new("Srs")
        .version("0.1.0")
        .about("Spaced repetition study shell")
        .arg(Arg::with_name("ITEMS")
             .help("Sets the YAML file of items to study")
             .default_value("items.yaml"))
        .arg(Arg::with_name("config")
             .short("c")
             .long("config")
             .value_name("FILE")
             .help("Sets an '.srs' settings file [default: built-in settings]")
             .takes_value(true))
        .arg(Arg::with_name("now")
             .short("n")
             .long("now")
             .value_name("UNIX")
             .help("Studies as if the current time was UNIX (in seconds)")
             .takes_value(true))
        .arg(Arg::with_name("seed")
             .long("seed")
             .value_name("N")
             .help("Seeds the interval fuzz, making intervals reproducible")
             .takes_value(true))
        .arg(Arg::with_name("queued")
             .short("q")
             .long("queued")
             .help("Prints number of due items and quits"))
        .get_matches();

    let clock = match matches.value_of("now") {
        Some(now) => Clock::Fixed(now.parse()?),
        None => Clock::System,
    };
    let rng = match matches.value_of("seed") {
        Some(seed) => StdRng::seed_from_u64(seed.parse()?),
        None => StdRng::from_rng(rand::thread_rng())?,
    };

    let configs = load_config(matches.value_of("config").map(path::Path::new))?;
    let queue = load_queue(path::Path::new(matches.value_of("ITEMS").unwrap_or("items.yaml")))?;

    // Lock stdout.
    let stdout = io::stdout();
    let mut stdout = stdout.lock();

    if matches.occurrences_of("queued") == 0 {
        let stdin = io::stdin();
        State::new(stdout, stdin.lock(), backend::IntervalScheduler::new(configs), queue, clock, rng).run()?;
    } else {
        writeln!(stdout, "{}", queue.due_count(clock.now()))?;
    }

    Ok(())
}

fn main() {
    // Log to stderr, such that the shell stays readable.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    if let Err(err) = main_err() {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}
