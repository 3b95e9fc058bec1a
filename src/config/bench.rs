use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use super::Settings;
use crate::error::{BenchError, Result};
use crate::loader::{BipartiteLayout, Distribution};
use crate::progress::{BarProgress, LineProgress, ProgressReporter, Silent};
use crate::storage::StoreOptions;

const MILLION: i64 = 1_000_000;

/// Which favorites-per-user figure sizes the users/books graph.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FavoritesKind {
    /// `minFavorites`.
    Min,
    /// `maxFavorites`.
    Max,
    /// Mean of the integers in `[minFavorites, maxFavorites)`.
    Expected,
}

impl FromStr for FavoritesKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, String> {
        match s.to_ascii_uppercase().as_str() {
            "MIN" => Ok(FavoritesKind::Min),
            "MAX" => Ok(FavoritesKind::Max),
            "EXPECTED" => Ok(FavoritesKind::Expected),
            other => Err(format!("unknown favorites kind {other}")),
        }
    }
}

impl fmt::Display for FavoritesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FavoritesKind::Min => "MIN",
            FavoritesKind::Max => "MAX",
            FavoritesKind::Expected => "EXPECTED",
        })
    }
}

/// How progress is rendered when `renderProgression` is on.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStyleKind {
    /// `N% -- Ss` lines on stdout.
    Lines,
    /// An indicatif bar.
    Bar,
}

impl FromStr for ProgressStyleKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, String> {
        match s.to_ascii_lowercase().as_str() {
            "lines" => Ok(ProgressStyleKind::Lines),
            "bar" => Ok(ProgressStyleKind::Bar),
            other => Err(format!("unknown progress style {other}")),
        }
    }
}

/// Where the store lives and how it is opened.
#[derive(Clone, Debug, Serialize)]
pub struct StoreSettings {
    /// Store directory (`storeDir`).
    pub dir: PathBuf,
    /// Fsync store files on close (`syncOnClose`).
    pub sync_on_close: bool,
    /// Wipe an existing store before loading (`cleanStore`).
    pub clean: bool,
}

impl StoreSettings {
    /// Resolves the store keys, defaulting the directory to `default_dir`.
    pub fn resolve(settings: &Settings, default_dir: &str) -> Result<Self> {
        Ok(Self {
            dir: PathBuf::from(settings.string("storeDir", default_dir)),
            sync_on_close: settings.boolean("syncOnClose", false)?,
            clean: settings.boolean("cleanStore", true)?,
        })
    }

    /// Options for the load phase.
    pub fn insert_options(&self) -> StoreOptions {
        StoreOptions::for_insert()
            .truncate(self.clean)
            .sync_on_close(self.sync_on_close)
    }

    /// Options for the traversal phase.
    pub fn read_options(&self) -> StoreOptions {
        StoreOptions::for_read()
    }
}

/// Resolved ring benchmark parameters.
///
/// Sizes are kept as read; the loader and the walk reject non-positive ones.
#[derive(Clone, Debug, Serialize)]
pub struct RingConfig {
    /// Store location.
    pub store: StoreSettings,
    /// Nodes in the cycle.
    pub length: i64,
    /// Timed windows per traversal.
    pub runs: i64,
    /// Length of one window in seconds.
    pub seconds: i64,
}

impl RingConfig {
    /// Default store directory.
    pub const DEFAULT_STORE_DIR: &'static str = "target/hopbench/ring";

    /// Reads every ring key from `settings`.
    pub fn resolve(settings: &Settings) -> Result<Self> {
        Ok(Self {
            store: StoreSettings::resolve(settings, Self::DEFAULT_STORE_DIR)?,
            length: settings.int("length", MILLION)?,
            runs: settings.int("runs", 5)?,
            seconds: settings.int("seconds", 10)?,
        })
    }
}

/// Resolved users/books benchmark parameters with derived graph sizes.
#[derive(Clone, Debug, Serialize)]
pub struct BooksConfig {
    /// Store location.
    pub store: StoreSettings,
    /// Which favorites figure was used.
    pub kind: FavoritesKind,
    /// Favorite books per user, possibly fractional.
    pub favorites: f64,
    /// Books and users per book actually built.
    pub layout: BipartiteLayout,
    /// Whether progress is reported at all.
    pub render_progression: bool,
    /// How progress is reported.
    pub progress_style: ProgressStyleKind,
    /// Full walks per traversal.
    pub num_traversals: i64,
    /// Write the primary root edge first and skip the book rotation.
    pub optimistic: bool,
    /// Seed for the scattered offsets; entropy when absent.
    pub seed: Option<u64>,
}

impl BooksConfig {
    /// Default store directory.
    pub const DEFAULT_STORE_DIR: &'static str = "target/hopbench/books";

    /// Reads every books key and derives the graph sizes.
    ///
    /// With `F` favorites per user, the graph holds `ceil(F)` books, each the
    /// favorite of `ceil(numUsers * F / numBooks)` users.
    pub fn resolve(settings: &Settings) -> Result<Self> {
        let num_books = settings.int("numBooks", MILLION)?;
        let num_users = settings.int("numUsers", 100 * MILLION)?;
        let min = settings.int("minFavorites", 100)?;
        let max = settings.int("maxFavorites", 1000)?;
        let kind = settings.parsed("kind", FavoritesKind::Expected, "MIN, MAX or EXPECTED")?;

        if num_books <= 0 || num_users <= 0 {
            return Err(BenchError::invalid_size(format!(
                "numBooks and numUsers must be positive, got {num_books} and {num_users}"
            )));
        }
        let favorites = match kind {
            FavoritesKind::Min => min as f64,
            FavoritesKind::Max => max as f64,
            FavoritesKind::Expected => {
                if max <= min {
                    return Err(BenchError::invalid_size(format!(
                        "maxFavorites ({max}) must exceed minFavorites ({min})"
                    )));
                }
                let sum = min
                    .checked_add(max)
                    .and_then(|sum| sum.checked_sub(1))
                    .ok_or_else(|| {
                        BenchError::invalid_size(format!(
                            "favorites range {min}..{max} is out of range"
                        ))
                    })?;
                sum as f64 / 2.0
            }
        };
        if favorites <= 0.0 {
            return Err(BenchError::invalid_size(format!(
                "favorites per user must be positive, got {favorites}"
            )));
        }
        let favorited = num_users as f64 * favorites / num_books as f64;
        let layout = BipartiteLayout::new(favorites.ceil() as u64, favorited.ceil() as u64)?;

        Ok(Self {
            store: StoreSettings::resolve(settings, Self::DEFAULT_STORE_DIR)?,
            kind,
            favorites,
            layout,
            render_progression: settings.boolean("renderProgression", true)?,
            progress_style: settings.parsed("progressStyle", ProgressStyleKind::Lines, "lines or bar")?,
            num_traversals: settings.int("numTraversals", 2)?,
            optimistic: settings.boolean("optimistic", false)?,
            seed: settings.optional("seed", "unsigned integer")?,
        })
    }

    /// Edge ordering used by the loader.
    pub fn distribution(&self) -> Distribution {
        Distribution::from_optimistic(self.optimistic)
    }

    /// Reporter matching `renderProgression` and `progressStyle`.
    pub fn progress_reporter(&self, label: &str) -> Box<dyn ProgressReporter> {
        if !self.render_progression {
            return Box::new(Silent);
        }
        match self.progress_style {
            ProgressStyleKind::Lines => Box::new(LineProgress),
            ProgressStyleKind::Bar => Box::new(BarProgress::new(label)),
        }
    }

    /// RNG for the scattered offsets.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

impl fmt::Display for BooksConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Users and Books traversal example, {} type {}graph.",
            self.kind,
            if self.optimistic { "optimistic " } else { "" }
        )?;
        write!(
            f,
            "Each user has {} favorite books and each book is the favorite of {} users.",
            self.layout.books, self.layout.users_per_book
        )
    }
}
