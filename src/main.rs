use clap::{Args, Parser, Subcommand};
use chrono::Utc;
use quizforge::catalog::TemplateCatalog;
use quizforge::config::AppConfig;
use quizforge::error::AppError;
use quizforge::quiz::{
    score_quiz, AttemptRecord, AttemptStore, InMemoryAttemptStore, Quiz, QuizBuilder, QuizKind,
    ScoreSummary,
};
use quizforge::{syllabus, telemetry};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "quizforge",
    about = "Generate and score randomized statistics quizzes from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the syllabus units (default command)
    Units,
    /// Generate a 15-question quiz for one unit
    Unit(UnitArgs),
    /// Generate a 75-question quiz across the whole syllabus
    Grand(PaperArgs),
    /// Regenerate a seeded quiz and score an answer sheet against it
    Score(ScoreArgs),
}

#[derive(Args, Debug)]
struct UnitArgs {
    /// Unit number (1-5) or full unit name
    #[arg(long)]
    unit: String,
    #[command(flatten)]
    paper: PaperArgs,
}

#[derive(Args, Debug, Default)]
struct PaperArgs {
    /// RNG seed for a reproducible paper
    #[arg(long)]
    seed: Option<u64>,
    /// Print the answer key and explanations after the questions
    #[arg(long)]
    show_answers: bool,
}

#[derive(Args, Debug)]
struct ScoreArgs {
    /// Unit number or name; omit to score a grand quiz
    #[arg(long)]
    unit: Option<String>,
    /// Seed the paper was generated with
    #[arg(long)]
    seed: u64,
    /// Comma-separated option numbers (1-4), '-' for a skipped question
    #[arg(long)]
    answers: String,
    /// Student identifier for the attempt record
    #[arg(long, default_value = "local")]
    student: String,
}

fn main() {
    if let Err(err) = run_cli() {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Units) {
        Command::Units => run_units(),
        Command::Unit(args) => run_unit(args),
        Command::Grand(args) => run_grand(args),
        Command::Score(args) => run_score(args),
    }
}

fn run_units() -> Result<(), AppError> {
    println!("Syllabus units");
    for (index, name) in syllabus::unit_names().iter().enumerate() {
        println!("{}. {}", index + 1, name);
    }
    Ok(())
}

fn run_unit(args: UnitArgs) -> Result<(), AppError> {
    let (config, catalog) = load_catalog()?;
    let unit_name = resolve_unit(&args.unit);
    let mut rng = paper_rng(args.paper.seed, &config);

    let builder = QuizBuilder::new(&catalog);
    let quiz = builder.unit_quiz(&unit_name, &mut rng)?;
    render_quiz(&quiz, args.paper.show_answers);
    Ok(())
}

fn run_grand(args: PaperArgs) -> Result<(), AppError> {
    let (config, catalog) = load_catalog()?;
    let mut rng = paper_rng(args.seed, &config);

    let builder = QuizBuilder::new(&catalog);
    let quiz = builder.grand_quiz(&mut rng)?;
    render_quiz(&quiz, args.show_answers);
    Ok(())
}

fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let (_, catalog) = load_catalog()?;
    let mut rng = StdRng::seed_from_u64(args.seed);
    let builder = QuizBuilder::new(&catalog);

    let (quiz, kind, unit_name) = match &args.unit {
        Some(unit) => {
            let name = resolve_unit(unit);
            let quiz = builder.unit_quiz(&name, &mut rng)?;
            (quiz, QuizKind::Unit, Some(name))
        }
        None => (builder.grand_quiz(&mut rng)?, QuizKind::Grand, None),
    };

    let answers = parse_answers(&args.answers);
    let summary = score_quiz(&quiz.questions, &answers)?;

    let mut store = InMemoryAttemptStore::new();
    store.record_attempt(AttemptRecord {
        student_id: args.student.clone(),
        quiz_kind: kind,
        unit_name,
        total_score: summary.total_score,
        max_score: summary.max_score,
        correct_count: summary.correct_count,
        question_count: summary.question_count,
        details: summary.details.clone(),
        taken_at: Utc::now(),
    });
    info!(
        student = %args.student,
        attempts = store.history(&args.student, None).len(),
        "attempt recorded"
    );

    render_score(&quiz, &summary);
    Ok(())
}

fn load_catalog() -> Result<(AppConfig, TemplateCatalog), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    let catalog = TemplateCatalog::from_path(&config.catalog.templates_path)?;
    Ok((config, catalog))
}

fn paper_rng(seed: Option<u64>, config: &AppConfig) -> StdRng {
    match seed.or(config.rng_seed) {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Accepts "2" as the second syllabus unit or a full unit name verbatim.
fn resolve_unit(raw: &str) -> String {
    if let Ok(number) = raw.trim().parse::<usize>() {
        if let Some(name) = syllabus::unit_by_number(number) {
            return name.to_string();
        }
    }
    raw.trim().to_string()
}

/// Parses a submitted sheet: 1-based option numbers, '-' for a skip.
/// Anything unparseable also counts as a skip.
fn parse_answers(raw: &str) -> Vec<Option<usize>> {
    raw.split(',')
        .map(|entry| {
            let entry = entry.trim();
            if entry.is_empty() || entry == "-" {
                return None;
            }
            entry
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
        })
        .collect()
}

fn render_quiz(quiz: &Quiz, show_answers: bool) {
    println!("{}", quiz.title);
    println!(
        "{} questions, {} marks",
        quiz.questions.len(),
        quiz.total_marks()
    );

    for (number, question) in quiz.questions.iter().enumerate() {
        println!(
            "\nQ{}. [{} mark{}] {}",
            number + 1,
            question.marks,
            if question.marks == 1 { "" } else { "s" },
            question.question_text
        );
        for (index, option) in question.options.iter().enumerate() {
            println!("  {}) {}", index + 1, option);
        }
    }

    if show_answers {
        println!("\nAnswer key");
        for (number, question) in quiz.questions.iter().enumerate() {
            println!(
                "Q{}: {}) {}",
                number + 1,
                question.correct_index + 1,
                question.correct_option()
            );
            if let Some(explanation) = &question.explanation {
                println!("    {explanation}");
            }
        }
    }
}

fn render_score(quiz: &Quiz, summary: &ScoreSummary) {
    println!("{} — results", quiz.title);
    println!(
        "Score: {}/{} ({:.1}%), {} of {} correct",
        summary.total_score,
        summary.max_score,
        summary.percentage(),
        summary.correct_count,
        summary.question_count
    );

    for (number, detail) in summary.details.iter().enumerate() {
        let verdict = if detail.is_correct {
            "correct"
        } else {
            "wrong"
        };
        let submitted = match detail.submitted {
            Some(index) => format!("{}", index + 1),
            None => "-".to_string(),
        };
        println!(
            "Q{}: answered {}, correct {}, {} (+{})",
            number + 1,
            submitted,
            detail.correct_index + 1,
            verdict,
            detail.marks_awarded
        );
    }
}
