use crate::{
    analyzer::{Analyzer, KeyCounts},
    die::Die,
    face::FaceValue,
    game::{Game, PlayFormat, PlayView},
    parse::{DieSpec, FaceList, WeightList},
    sim_rng, DEFAULT_FORMAT, DEFAULT_NDICE, DEFAULT_ROLLS,
};
use itertools::Itertools;
use pico_args;
use std::{fmt, iter, str::FromStr, time::Duration};
use tabular::{row, Row, Table};

/// Longest table we'll print before eliding the rest with '...'.
const MAX_TABLE_ROWS: usize = 20;

///////////////////////////
// String parser helpers //
///////////////////////////

fn parse_req<T>(label: &'static str, s: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    T::from_str(s).map_err(|err| format!("invalid {label}: {err}"))
}

fn parse_opt<T>(label: &'static str, opt_s: Option<&str>) -> Result<Option<T>, String>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    opt_s
        .map(T::from_str)
        .transpose()
        .map_err(|err| format!("invalid {label}: {err}"))
}

/// Parse the faces and weights shared by every subcommand, then build the die
/// once up front so bad weights are reported before any work starts.
fn parse_die_spec(weights: Option<&str>, faces: &str) -> Result<DieSpec, String> {
    let spec = DieSpec::new(
        parse_req::<FaceList>("faces", faces)?,
        parse_opt::<WeightList>("weights", weights)?.unwrap_or_default(),
    );
    spec.to_die()?;
    Ok(spec)
}

//////////////////////
// CLI Args Wrapper //
//////////////////////

pub struct Args(pico_args::Arguments);

impl Args {
    pub fn new(inner: pico_args::Arguments) -> Self {
        Self(inner)
    }

    fn subcommand(&mut self) -> Result<Option<String>, String> {
        self.0.subcommand().map_err(|err| err.to_string())
    }

    fn opt_value(&mut self, keys: impl Into<pico_args::Keys>) -> Result<Option<String>, String> {
        self.0
            .opt_value_from_fn(keys, |s| Result::<_, pico_args::Error>::Ok(s.to_owned()))
            .map_err(|err| err.to_string())
    }

    fn free_value(&mut self) -> Result<String, String> {
        self.0
            .free_from_fn(|s| Result::<_, pico_args::Error>::Ok(s.to_owned()))
            .map_err(|err| err.to_string())
    }

    fn expect_finished(self) -> Result<(), String> {
        let remaining = self.0.finish();
        if !remaining.is_empty() {
            Err(format!("unexpected arguments left: '{:?}'", remaining))
        } else {
            Ok(())
        }
    }

    fn maybe_help(&mut self, usage: &str) {
        if self.0.contains(["-h", "--help"]) {
            print!("{}", usage);
            std::process::exit(0);
        }
    }
}

/////////////
// Metrics //
/////////////

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Metrics(pub Vec<(String, String)>);

impl Metrics {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, label: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.push((label.into(), value.into()));
        self
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, value)| value.as_str())
    }

    pub fn to_table(&self) -> Table {
        let mut table = Table::new("{:>}  {:<}");

        for (label, value) in &self.0 {
            table.add_row(row!(label, value));
        }

        table
    }
}

fn push_common_metrics(
    metrics: &mut Metrics,
    duration: Duration,
    seed: Option<u64>,
    die: &DieSpec,
) {
    metrics.push("duration", format!("{:.2?}", duration));
    metrics.push(
        "seed",
        seed.map(|seed| seed.to_string())
            .unwrap_or_else(|| "(entropy)".to_owned()),
    );
    metrics.push("die", die.to_string());
}

///////////////////
// Table helpers //
///////////////////

fn row_from_cells(cells: impl Iterator<Item = String>) -> Row {
    let mut row = Row::new();
    for cell in cells {
        row.add_cell(cell);
    }
    row
}

/// A row of `ncols` cells marking `nhidden` elided rows.
fn ellipsis_row(ncols: usize, nhidden: usize) -> Row {
    let cells = iter::once("...".to_owned())
        .chain(iter::once(format!("(+ {nhidden})")))
        .chain(iter::repeat_with(String::new))
        .take(ncols);
    row_from_cells(cells)
}

fn column_spec(ncols: usize) -> String {
    iter::repeat("{:>}").take(ncols).join("  ")
}

fn fmt_key(key: &[FaceValue]) -> String {
    format!("[{}]", key.iter().join(", "))
}

fn key_counts_table(heading: &str, counts: &KeyCounts<FaceValue>, nrolls: usize) -> Table {
    let mut table = Table::new("{:>}  {:>}  {:<}").with_row(row!(
        format!("{:>12}", heading),
        "count",
        "freq"
    ));

    for (key, count) in counts.iter().take(MAX_TABLE_ROWS) {
        let freq = if nrolls == 0 {
            0.0
        } else {
            (count as f64) / (nrolls as f64)
        };
        table.add_row(row!(fmt_key(key), count, format!("{freq:.4}")));
    }

    let len = counts.len();
    if len > MAX_TABLE_ROWS {
        table.add_row(ellipsis_row(3, len - MAX_TABLE_ROWS));
    }

    table
}

///////////////////
// Command trait //
///////////////////

pub trait Command: Sized {
    const USAGE: &'static str;

    type Output: fmt::Display;

    fn try_from_cli_args(args: Args) -> Result<Self, String>;
    fn run(self) -> Result<Self::Output, String>;
}

/////////////////
// RollCommand //
/////////////////

#[derive(Clone, Debug)]
pub struct RollCommand {
    die: DieSpec,
    rolls: usize,
    seed: Option<u64>,
}

impl RollCommand {
    pub fn try_from_str_args(
        rolls: Option<&str>,
        weights: Option<&str>,
        seed: Option<&str>,
        faces: &str,
    ) -> Result<Self, String> {
        Ok(Self {
            die: parse_die_spec(weights, faces)?,
            rolls: parse_opt("rolls", rolls)?.unwrap_or(DEFAULT_ROLLS),
            seed: parse_opt("seed", seed)?,
        })
    }
}

impl Command for RollCommand {
    const USAGE: &'static str = "\
montecarlo roll - roll a single die and compare the observed faces to its weights

USAGE:
    montecarlo roll [option ...] <faces>

EXAMPLES:
    montecarlo roll [1,2,3,4,5,6]
    montecarlo roll -n 10000 -w [6:5] --seed 42 [1,2,3,4,5,6]
    montecarlo roll [H,T]

OPTIONS:
    · --rolls / -n rolls (default: 1000)
      How many times to roll the die.

    · --weights / -w [face:weight,..] (default: every face weighs 1.0)
      Weight overrides. For example, a die that shows 6 five times as often as
      any other face would be `-w [6:5]`.

    · --seed seed (default: seeded from the OS)
      Seed the random number generator for a reproducible run.
";

    type Output = RollCommandOutput;

    fn try_from_cli_args(mut args: Args) -> Result<Self, String> {
        args.maybe_help(Self::USAGE);

        let rolls = args.opt_value(["-n", "--rolls"])?;
        let weights = args.opt_value(["-w", "--weights"])?;
        let seed = args.opt_value("--seed")?;
        let faces = args.free_value()?;
        args.expect_finished()?;

        Self::try_from_str_args(
            rolls.as_deref(),
            weights.as_deref(),
            seed.as_deref(),
            &faces,
        )
    }

    fn run(self) -> Result<Self::Output, String> {
        let die = self.die.to_die()?;
        let mut rng = sim_rng(self.seed);

        let (samples, duration) = time!("roll", die.roll(self.rolls, &mut rng));
        let samples = samples.map_err(|err| err.to_string())?;

        let pvalue = die.fit_pvalue(&samples).map_err(|err| err.to_string())?;

        let mut metrics = Metrics::new();
        metrics.push("rolls", samples.len().to_string());
        metrics.push("fit p-value", format!("{pvalue:.4}"));
        push_common_metrics(&mut metrics, duration, self.seed, &self.die);

        Ok(RollCommandOutput {
            die,
            samples,
            metrics,
        })
    }
}

#[derive(Debug)]
pub struct RollCommandOutput {
    die: Die<FaceValue>,
    samples: Vec<FaceValue>,
    metrics: Metrics,
}

impl fmt::Display for RollCommandOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts = self.samples.iter().counts();
        let n = self.samples.len();

        let mut table = Table::new("{:>}  {:>}  {:<}  {:>}  {:<}").with_row(row!(
            format!("{:>8}", "face"),
            "weight",
            "p",
            "count",
            "p_hat"
        ));

        let state = self.die.current_state();
        for ((face, weight), (_, p)) in state.iter().zip(state.pmf()) {
            let count = counts.get(face).copied().unwrap_or(0);
            let p_hat = if n == 0 {
                0.0
            } else {
                (count as f64) / (n as f64)
            };
            table.add_row(row!(
                face,
                weight,
                format!("{p:.4}"),
                count,
                format!("{p_hat:.4}")
            ));
        }

        let preview = self.samples.iter().take(MAX_TABLE_ROWS).join(" ");
        let more = if n > MAX_TABLE_ROWS { " ..." } else { "" };

        write!(
            f,
            "\n{}\n{}{}\n\n{}",
            table,
            preview,
            more,
            self.metrics.to_table()
        )
    }
}

/////////////////
// PlayCommand //
/////////////////

#[derive(Clone, Debug)]
pub struct PlayCommand {
    die: DieSpec,
    rolls: usize,
    ndice: usize,
    format: PlayFormat,
    seed: Option<u64>,
}

impl PlayCommand {
    pub fn try_from_str_args(
        rolls: Option<&str>,
        ndice: Option<&str>,
        format: Option<&str>,
        weights: Option<&str>,
        seed: Option<&str>,
        faces: &str,
    ) -> Result<Self, String> {
        let cmd = Self {
            die: parse_die_spec(weights, faces)?,
            rolls: parse_opt("rolls", rolls)?.unwrap_or(DEFAULT_ROLLS),
            ndice: parse_opt("ndice", ndice)?.unwrap_or(DEFAULT_NDICE),
            format: parse_opt("format", format)?.unwrap_or(DEFAULT_FORMAT),
            seed: parse_opt("seed", seed)?,
        };

        if cmd.ndice == 0 {
            return Err("a game needs at least one die".to_owned());
        }

        Ok(cmd)
    }
}

/// Play `ndice` copies of the die `rolls` times. The copies share their
/// weights, like passing the same die to a game several times.
fn play_game(
    spec: &DieSpec,
    ndice: usize,
    rolls: usize,
    seed: Option<u64>,
) -> Result<(Game<FaceValue>, Duration), String> {
    let die = spec.to_die()?;
    let mut game = Game::new(vec![die; ndice]).map_err(|err| err.to_string())?;
    let mut rng = sim_rng(seed);

    let (result, duration) = time!("play", game.play(rolls, &mut rng));
    result.map_err(|err| err.to_string())?;

    Ok((game, duration))
}

impl Command for PlayCommand {
    const USAGE: &'static str = "\
montecarlo play - roll several copies of a die together and show every outcome

USAGE:
    montecarlo play [option ...] <faces>

EXAMPLES:
    montecarlo play [1,2,3,4,5,6]
    montecarlo play -r 50 -d 5 -f narrow --seed 42 [H,T]

OPTIONS:
    · --rolls / -r rolls (default: 1000)
      How many times to roll all the dice.

    · --ndice / -d n (default: 3)
      How many copies of the die to roll together.

    · --format / -f wide|narrow (default: wide)
      wide: one row per roll, one column per die.
      narrow: one (die, roll, face) row per outcome.

    · --weights / -w [face:weight,..] (default: every face weighs 1.0)
      Weight overrides, applied to every copy of the die.

    · --seed seed (default: seeded from the OS)
      Seed the random number generator for a reproducible run.
";

    type Output = PlayCommandOutput;

    fn try_from_cli_args(mut args: Args) -> Result<Self, String> {
        args.maybe_help(Self::USAGE);

        let rolls = args.opt_value(["-r", "--rolls"])?;
        let ndice = args.opt_value(["-d", "--ndice"])?;
        let format = args.opt_value(["-f", "--format"])?;
        let weights = args.opt_value(["-w", "--weights"])?;
        let seed = args.opt_value("--seed")?;
        let faces = args.free_value()?;
        args.expect_finished()?;

        Self::try_from_str_args(
            rolls.as_deref(),
            ndice.as_deref(),
            format.as_deref(),
            weights.as_deref(),
            seed.as_deref(),
            &faces,
        )
    }

    fn run(self) -> Result<Self::Output, String> {
        let (game, duration) = play_game(&self.die, self.ndice, self.rolls, self.seed)?;
        let view = game
            .show_last_play(self.format)
            .map_err(|err| err.to_string())?;

        let mut metrics = Metrics::new();
        metrics.push("rolls", self.rolls.to_string());
        metrics.push("ndice", self.ndice.to_string());
        metrics.push("format", self.format.to_string());
        push_common_metrics(&mut metrics, duration, self.seed, &self.die);

        Ok(PlayCommandOutput { view, metrics })
    }
}

#[derive(Debug)]
pub struct PlayCommandOutput {
    view: PlayView<FaceValue>,
    metrics: Metrics,
}

impl PlayCommandOutput {
    fn to_table(&self) -> Table {
        match &self.view {
            PlayView::Wide(wide) => {
                let ncols = wide.ndice() + 1;
                let mut table = Table::new(&column_spec(ncols)).with_row(row_from_cells(
                    iter::once("roll".to_owned()).chain((0..wide.ndice()).map(|d| format!("die {d}"))),
                ));

                for (idx, roll) in wide.rolls().enumerate().take(MAX_TABLE_ROWS) {
                    let cells =
                        iter::once(idx.to_string()).chain(roll.iter().map(|face| face.to_string()));
                    table.add_row(row_from_cells(cells));
                }
                if wide.nrolls() > MAX_TABLE_ROWS {
                    table.add_row(ellipsis_row(ncols, wide.nrolls() - MAX_TABLE_ROWS));
                }
                table
            }
            PlayView::Narrow(narrow) => {
                let mut table = Table::new(&column_spec(3)).with_row(row!("die", "roll", "face"));

                for r in narrow.iter().take(MAX_TABLE_ROWS) {
                    table.add_row(row!(r.die, r.roll, &r.face));
                }
                if narrow.len() > MAX_TABLE_ROWS {
                    table.add_row(ellipsis_row(3, narrow.len() - MAX_TABLE_ROWS));
                }
                table
            }
        }
    }
}

impl fmt::Display for PlayCommandOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\n{}\n{}", self.to_table(), self.metrics.to_table())
    }
}

////////////////////
// AnalyzeCommand //
////////////////////

#[derive(Clone, Debug)]
pub struct AnalyzeCommand {
    die: DieSpec,
    rolls: usize,
    ndice: usize,
    seed: Option<u64>,
}

impl AnalyzeCommand {
    pub fn try_from_str_args(
        rolls: Option<&str>,
        ndice: Option<&str>,
        weights: Option<&str>,
        seed: Option<&str>,
        faces: &str,
    ) -> Result<Self, String> {
        let cmd = Self {
            die: parse_die_spec(weights, faces)?,
            rolls: parse_opt("rolls", rolls)?.unwrap_or(DEFAULT_ROLLS),
            ndice: parse_opt("ndice", ndice)?.unwrap_or(DEFAULT_NDICE),
            seed: parse_opt("seed", seed)?,
        };

        if cmd.ndice == 0 {
            return Err("a game needs at least one die".to_owned());
        }

        Ok(cmd)
    }
}

impl Command for AnalyzeCommand {
    const USAGE: &'static str = "\
montecarlo analyze - play a game, then count jackpots, faces, combos, and
    permutations across the rolls

USAGE:
    montecarlo analyze [option ...] <faces>

EXAMPLES:
    montecarlo analyze [1,2,3,4,5,6]
    montecarlo analyze -r 10000 -d 5 -w [6:5] --seed 42 [1,2,3,4,5,6]

OPTIONS:
    · --rolls / -r rolls (default: 1000)
      How many times to roll all the dice.

    · --ndice / -d n (default: 3)
      How many copies of the die to roll together.

    · --weights / -w [face:weight,..] (default: every face weighs 1.0)
      Weight overrides, applied to every copy of the die.

    · --seed seed (default: seeded from the OS)
      Seed the random number generator for a reproducible run.
";

    type Output = AnalyzeCommandOutput;

    fn try_from_cli_args(mut args: Args) -> Result<Self, String> {
        args.maybe_help(Self::USAGE);

        let rolls = args.opt_value(["-r", "--rolls"])?;
        let ndice = args.opt_value(["-d", "--ndice"])?;
        let weights = args.opt_value(["-w", "--weights"])?;
        let seed = args.opt_value("--seed")?;
        let faces = args.free_value()?;
        args.expect_finished()?;

        Self::try_from_str_args(
            rolls.as_deref(),
            ndice.as_deref(),
            weights.as_deref(),
            seed.as_deref(),
            &faces,
        )
    }

    fn run(self) -> Result<Self::Output, String> {
        let (game, play_duration) = play_game(&self.die, self.ndice, self.rolls, self.seed)?;
        let analyzer = Analyzer::new(&game).map_err(|err| err.to_string())?;

        let ((jackpots, face_totals, combos, permutations), analyze_duration) =
            time!("analyze", {
                (
                    analyzer.count_jackpots(),
                    analyzer.count_faces().totals(),
                    analyzer.count_combos(),
                    analyzer.count_permutations(),
                )
            });

        let nfaces = self.die.faces.faces().len() as u64;
        let ndice = self.ndice as u64;
        let fmt_possible = |n: Option<u64>| n.map(|n| n.to_string()).unwrap_or_else(|| "overflow".to_owned());

        let mut metrics = Metrics::new();
        metrics.push("rolls", self.rolls.to_string());
        metrics.push("ndice", self.ndice.to_string());
        metrics.push("jackpots", jackpots.to_string());
        metrics.push(
            "jackpot rate",
            format!("{:.4}", (jackpots as f64) / (self.rolls.max(1) as f64)),
        );
        metrics.push(
            "distinct combos",
            format!(
                "{} (of {} possible)",
                combos.len(),
                fmt_possible(crate::num_multisets(nfaces, ndice))
            ),
        );
        metrics.push(
            "distinct permutations",
            format!(
                "{} (of {} possible)",
                permutations.len(),
                fmt_possible(crate::num_permutations(nfaces, ndice))
            ),
        );
        metrics.push("analyze duration", format!("{:.2?}", analyze_duration));
        push_common_metrics(&mut metrics, play_duration, self.seed, &self.die);

        Ok(AnalyzeCommandOutput {
            nrolls: self.rolls,
            jackpots,
            face_totals,
            combos,
            permutations,
            metrics,
        })
    }
}

#[derive(Debug)]
pub struct AnalyzeCommandOutput {
    nrolls: usize,
    jackpots: usize,
    face_totals: Vec<(FaceValue, usize)>,
    combos: KeyCounts<FaceValue>,
    permutations: KeyCounts<FaceValue>,
    metrics: Metrics,
}

impl fmt::Display for AnalyzeCommandOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut faces = Table::new("{:>}  {:>}").with_row(row!(format!("{:>8}", "face"), "count"));
        for (face, count) in &self.face_totals {
            faces.add_row(row!(face, count));
        }

        write!(
            f,
            "\n{}\n{}\n{}\n{}",
            faces,
            key_counts_table("combo", &self.combos, self.nrolls),
            key_counts_table("permutation", &self.permutations, self.nrolls),
            self.metrics.to_table()
        )
    }
}

/////////////////
// BaseCommand //
/////////////////

#[derive(Debug)]
pub enum BaseCommand {
    Roll(RollCommand),
    Play(PlayCommand),
    Analyze(AnalyzeCommand),
}

impl Command for BaseCommand {
    const USAGE: &'static str = "\
montecarlo - explore dice probabilities by simulation

USAGE:
    montecarlo [option ...] <subcommand>

SUBCOMMANDS:
    · montecarlo roll - roll one die and check the faces against its weights
    · montecarlo play - roll several dice together and show the outcomes
    · montecarlo analyze - count jackpots, faces, combos, and permutations

Set RUST_LOG=debug to see timings and sampling diagnostics.
";

    type Output = String;

    fn try_from_cli_args(mut args: Args) -> Result<Self, String> {
        let maybe_subcommand = args.subcommand()?;

        match maybe_subcommand.as_deref() {
            Some("roll") => Ok(Self::Roll(RollCommand::try_from_cli_args(args)?)),
            Some("play") => Ok(Self::Play(PlayCommand::try_from_cli_args(args)?)),
            Some("analyze") => Ok(Self::Analyze(AnalyzeCommand::try_from_cli_args(args)?)),
            Some(command) => Err(format!("'{}' is not a recognized command", command)),
            None => {
                args.maybe_help(Self::USAGE);
                Err("no subcommand specified".to_string())
            }
        }
    }

    fn run(self) -> Result<String, String> {
        match self {
            Self::Roll(cmd) => cmd.run().map(|out| out.to_string()),
            Self::Play(cmd) => cmd.run().map(|out| out.to_string()),
            Self::Analyze(cmd) => cmd.run().map(|out| out.to_string()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use claim::{assert_err, assert_le, assert_ok};

    fn cli_args(args: &[&str]) -> Args {
        Args::new(pico_args::Arguments::from_vec(
            args.iter().map(|arg| arg.into()).collect(),
        ))
    }

    #[test]
    fn test_roll_command_args() {
        assert_err!(RollCommand::try_from_str_args(None, None, None, "[]"));
        assert_err!(RollCommand::try_from_str_args(Some("lots"), None, None, "[1,2]"));
        assert_err!(RollCommand::try_from_str_args(None, Some("[3:1]"), None, "[1,2]"));
        assert_err!(RollCommand::try_from_str_args(None, Some("[2:-1]"), None, "[1,2]"));
        assert_err!(RollCommand::try_from_str_args(None, None, Some("-1"), "[1,2]"));

        // each weight is finite, but not their sum
        let err = RollCommand::try_from_str_args(
            Some("10"),
            Some("[1:1.7e308,2:1.7e308]"),
            Some("1"),
            "[1,2]",
        )
        .unwrap_err();
        assert!(err.contains("overflow"), "{err}");

        let cmd = RollCommand::try_from_str_args(None, None, None, "[1,2]").unwrap();
        assert_eq!(DEFAULT_ROLLS, cmd.rolls);
        assert_eq!(None, cmd.seed);
    }

    #[test]
    fn test_roll_command_run() {
        let cmd =
            RollCommand::try_from_str_args(Some("500"), Some("[6:5]"), Some("42"), "[1,2,3,4,5,6]")
                .unwrap();
        let out = cmd.clone().run().unwrap();
        assert_eq!(500, out.samples.len());
        assert_eq!(Some("500"), out.metrics.get("rolls"));
        assert_eq!(Some("42"), out.metrics.get("seed"));

        // same seed, same rolls
        let out2 = cmd.run().unwrap();
        assert_eq!(out.samples, out2.samples);

        let rendered = out.to_string();
        assert!(rendered.contains("fit p-value"));
    }

    #[test]
    fn test_roll_command_zero_weights() {
        let cmd = RollCommand::try_from_str_args(Some("3"), Some("[H:0,T:0]"), None, "[H,T]").unwrap();
        assert_err!(cmd.run());
    }

    #[test]
    fn test_play_command() {
        assert_err!(PlayCommand::try_from_str_args(
            None,
            Some("0"),
            None,
            None,
            None,
            "[1,2]"
        ));
        assert_err!(PlayCommand::try_from_str_args(
            None,
            None,
            Some("tall"),
            None,
            None,
            "[1,2]"
        ));

        let cmd = PlayCommand::try_from_str_args(
            Some("50"),
            Some("4"),
            Some("narrow"),
            None,
            Some("7"),
            "[H,T]",
        )
        .unwrap();
        let out = cmd.run().unwrap();
        let narrow = out.view.into_narrow().unwrap();
        assert_eq!(50 * 4, narrow.len());

        let cmd =
            PlayCommand::try_from_str_args(Some("5"), Some("2"), None, None, Some("7"), "[1,2,3]")
                .unwrap();
        let out = cmd.run().unwrap();
        assert_eq!(PlayFormat::Wide, out.view.format());
        let rendered = out.to_string();
        assert!(rendered.contains("die 1"));
    }

    #[test]
    fn test_analyze_command() {
        let cmd = AnalyzeCommand::try_from_str_args(
            Some("200"),
            Some("3"),
            Some("[1:10]"),
            Some("1"),
            "[1,2]",
        )
        .unwrap();
        let out = cmd.run().unwrap();

        assert_le!(out.jackpots, 200);
        assert_eq!(200, out.combos.total());
        assert_le!(out.combos.len(), 4);
        assert_eq!(200, out.permutations.total());
        assert!(out.to_string().contains("permutation"));
        assert_eq!(200 * 3, out.face_totals.iter().map(|(_, c)| c).sum::<usize>());
        assert_eq!(
            Some("4"),
            out.metrics
                .get("distinct combos")
                .and_then(|s| s.split("of ").nth(1))
                .and_then(|s| s.split(' ').next())
        );
    }

    #[test]
    fn test_base_command() {
        assert_err!(BaseCommand::try_from_cli_args(cli_args(&[])));
        assert_err!(BaseCommand::try_from_cli_args(cli_args(&["bogus"])));
        assert_err!(BaseCommand::try_from_cli_args(cli_args(&[
            "roll", "[1,2]", "extra"
        ])));

        let cmd = BaseCommand::try_from_cli_args(cli_args(&[
            "play", "-r", "3", "-d", "2", "--seed", "9", "[1,2,3]",
        ]));
        assert_ok!(&cmd);
        assert_ok!(cmd.unwrap().run());

        let cmd = BaseCommand::try_from_cli_args(cli_args(&[
            "analyze", "--seed", "9", "-w", "[6:5]", "[1,2,3,4,5,6]",
        ]))
        .unwrap();
        assert_ok!(cmd.run());
    }

    #[test]
    fn test_ellipsis_row_width() {
        assert_eq!("{:>}  {:>}  {:>}", column_spec(3));
        // tabular panics on rows with the wrong number of cells
        let mut table = Table::new(&column_spec(4));
        table.add_row(ellipsis_row(4, 10));
        assert!(table.to_string().contains("(+ 10)"));
    }
}
