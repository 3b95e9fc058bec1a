//! Named benchmark entry points.
//!
//! Each benchmark exposes a small set of entries (`create`, `traverse`).
//! Entries declare the names of their positional parameters; positional
//! arguments on the command line bind to those names as config overrides.

use std::collections::HashSet;
use std::fmt;
use std::io::{BufRead, Write};

use tracing::debug;

use super::{books, ring, Outcome};
use crate::config::Settings;
use crate::error::{BenchError, Result};

/// Environment variable naming the entry to run when none is given.
pub const DISPATCH_ENV: &str = "HOPBENCH_DISPATCH";

/// Function run for an entry.
pub type Handler = fn(&Settings) -> Result<Outcome>;

/// One runnable entry point.
#[derive(Clone)]
pub struct Entry {
    /// Name used to select the entry.
    pub name: &'static str,
    /// Config keys bound, in order, to positional arguments.
    pub params: &'static [&'static str],
    /// One-line description.
    pub about: &'static str,
    handler: Handler,
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl Entry {
    /// Declares an entry.
    pub fn new(
        name: &'static str,
        params: &'static [&'static str],
        about: &'static str,
        handler: Handler,
    ) -> Self {
        Self {
            name,
            params,
            about,
            handler,
        }
    }

    /// Pairs positional `args` with the declared parameter names.
    ///
    /// Fewer arguments than parameters is fine; the rest fall back to the
    /// other config layers. More arguments than parameters is an error.
    pub fn bind(&self, args: &[String]) -> Result<Vec<(String, String)>> {
        if args.len() > self.params.len() {
            return Err(BenchError::Command(format!(
                "'{}' takes at most {} argument(s) ({}), got {}",
                self.name,
                self.params.len(),
                self.params.join(", "),
                args.len()
            )));
        }
        Ok(self
            .params
            .iter()
            .zip(args)
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect())
    }

    /// Runs the entry against resolved settings.
    pub fn run(&self, settings: &Settings) -> Result<Outcome> {
        debug!(entry = self.name, "running entry");
        (self.handler)(settings)
    }
}

/// A named group of entries sharing one config section.
#[derive(Clone, Debug)]
pub struct Benchmark {
    /// Name used on the command line and as config section.
    pub name: &'static str,
    /// One-line description.
    pub about: &'static str,
    entries: Vec<Entry>,
}

impl Benchmark {
    /// Declares a benchmark with its entries.
    pub fn new(name: &'static str, about: &'static str, entries: Vec<Entry>) -> Self {
        Self {
            name,
            about,
            entries,
        }
    }

    /// Entries in declaration order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Entry called `name`.
    pub fn entry(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// Picks the entry to run and the positional arguments left for it.
    ///
    /// The first argument wins when it names an entry. Otherwise `dispatch`
    /// (usually `HOPBENCH_DISPATCH`) is tried, and failing that the user is
    /// prompted on `input` until a valid name is typed. End of input yields
    /// `None`.
    pub fn select<'a, 'b, R, W>(
        &'a self,
        args: &'b [String],
        dispatch: Option<&str>,
        input: &mut R,
        output: &mut W,
    ) -> Result<Option<(&'a Entry, &'b [String])>>
    where
        R: BufRead,
        W: Write,
    {
        if let Some((first, rest)) = args.split_first() {
            if let Some(entry) = self.entry(first) {
                return Ok(Some((entry, rest)));
            }
        }
        if let Some(entry) = dispatch.and_then(|name| self.entry(name.trim())) {
            return Ok(Some((entry, args)));
        }

        let mut line = String::new();
        loop {
            writeln!(output, "Welcome to {}, valid entry points:", self.name)?;
            for entry in &self.entries {
                writeln!(output, "{}", entry.name)?;
            }
            write!(output, "please choose entry point: ")?;
            output.flush()?;

            line.clear();
            if input.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            if let Some(entry) = self.entry(line.trim()) {
                return Ok(Some((entry, args)));
            }
        }
    }
}

/// Every benchmark the binary knows about.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    benchmarks: Vec<Benchmark>,
}

impl Registry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The ring and users/books benchmarks.
    pub fn standard() -> Result<Self> {
        let mut registry = Self::new();
        registry.register(Benchmark::new(
            "ring",
            "NEXT cycle insert and walk",
            vec![
                Entry::new("create", &["length"], "build the ring", ring::create_entry),
                Entry::new(
                    "traverse",
                    &["runs", "seconds"],
                    "walk the ring in timed windows",
                    ring::traverse_entry,
                ),
            ],
        ))?;
        registry.register(Benchmark::new(
            "books",
            "users and favorite books insert and two-hop walk",
            vec![
                Entry::new("create", &[], "build the users/books graph", books::create_entry),
                Entry::new(
                    "traverse",
                    &[],
                    "count users through their books",
                    books::traverse_entry,
                ),
            ],
        ))?;
        Ok(registry)
    }

    /// Adds a benchmark after validating its declaration.
    pub fn register(&mut self, benchmark: Benchmark) -> Result<()> {
        if self.get(benchmark.name).is_some() {
            return Err(BenchError::Command(format!(
                "benchmark '{}' registered twice",
                benchmark.name
            )));
        }
        if benchmark.entries.is_empty() {
            return Err(BenchError::Command(format!(
                "benchmark '{}' has no entry points",
                benchmark.name
            )));
        }
        let mut names = HashSet::new();
        for entry in &benchmark.entries {
            if !names.insert(entry.name) {
                return Err(BenchError::Command(format!(
                    "benchmark '{}' has multiple entries called '{}'",
                    benchmark.name, entry.name
                )));
            }
            let mut params = HashSet::new();
            if let Some(dup) = entry.params.iter().find(|p| !params.insert(**p)) {
                return Err(BenchError::Command(format!(
                    "entry '{}.{}' declares parameter '{}' twice",
                    benchmark.name, entry.name, dup
                )));
            }
        }
        self.benchmarks.push(benchmark);
        Ok(())
    }

    /// Benchmarks in registration order.
    pub fn benchmarks(&self) -> &[Benchmark] {
        &self.benchmarks
    }

    /// Benchmark called `name`, if registered.
    pub fn get(&self, name: &str) -> Option<&Benchmark> {
        self.benchmarks.iter().find(|bench| bench.name == name)
    }

    /// Benchmark called `name`, or a `Command` error listing the valid names.
    pub fn benchmark(&self, name: &str) -> Result<&Benchmark> {
        self.get(name).ok_or_else(|| {
            let valid: Vec<_> = self.benchmarks.iter().map(|b| b.name).collect();
            BenchError::Command(format!(
                "unknown benchmark '{name}', expected one of: {}",
                valid.join(", ")
            ))
        })
    }
}
