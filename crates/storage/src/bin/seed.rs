use std::fmt;

use chrono::{DateTime, Duration, Utc};
use pathway_core::model::{CourseLevel, LessonKind, LessonStatus, UserId};
use storage::repository::{NewCourseRecord, NewLessonRecord, NewPathRecord, Storage};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    user: Option<UserId>,
    path_title: String,
    path_desc: Option<String>,
    courses: u32,
    lessons: u32,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidUser { raw: String },
    InvalidCourses { raw: String },
    InvalidLessons { raw: String },
    InvalidDbUrl { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidUser { raw } => write!(f, "invalid --user value (expected UUID): {raw}"),
            ArgsError::InvalidCourses { raw } => write!(f, "invalid --courses value: {raw}"),
            ArgsError::InvalidLessons { raw } => write!(f, "invalid --lessons value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("PATHWAY_DB_URL").unwrap_or_else(|_| "sqlite:dev.sqlite3".into());
        let mut user = std::env::var("PATHWAY_USER")
            .ok()
            .and_then(|value| value.parse::<UserId>().ok());
        let mut path_title =
            std::env::var("PATHWAY_PATH_TITLE").unwrap_or_else(|_| "Learn Rust".into());
        let mut path_desc = std::env::var("PATHWAY_PATH_DESC").ok();
        let mut courses = std::env::var("PATHWAY_COURSES")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(2);
        let mut lessons = std::env::var("PATHWAY_LESSONS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(3);
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--user" => {
                    let value = require_value(&mut args, "--user")?;
                    let parsed = value
                        .parse::<UserId>()
                        .map_err(|_| ArgsError::InvalidUser { raw: value.clone() })?;
                    user = Some(parsed);
                }
                "--path-title" => {
                    let value = require_value(&mut args, "--path-title")?;
                    path_title = value;
                }
                "--path-desc" => {
                    let value = require_value(&mut args, "--path-desc")?;
                    path_desc = Some(value);
                }
                "--courses" => {
                    let value = require_value(&mut args, "--courses")?;
                    courses = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidCourses { raw: value.clone() })?;
                }
                "--lessons" => {
                    let value = require_value(&mut args, "--lessons")?;
                    lessons = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidLessons { raw: value.clone() })?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            user,
            path_title,
            path_desc,
            courses,
            lessons,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:dev.sqlite3)");
    eprintln!("  --user <uuid>             Owner user id (default: random)");
    eprintln!("  --path-title <name>       Path title (default: Learn Rust)");
    eprintln!("  --path-desc <text>        Optional path description");
    eprintln!("  --courses <n>             Number of courses to create (default: 2)");
    eprintln!("  --lessons <n>             Lessons per course (default: 3)");
    eprintln!("  --now <rfc3339>           Fixed current time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!(
        "  PATHWAY_DB_URL, PATHWAY_USER, PATHWAY_PATH_TITLE, PATHWAY_PATH_DESC, PATHWAY_COURSES, PATHWAY_LESSONS"
    );
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);
    let user = args.user.unwrap_or_else(UserId::random);

    let path_id = storage
        .paths
        .insert_new_path(NewPathRecord {
            owner: user,
            title: args.path_title.clone(),
            description: args.path_desc.clone(),
            created_at: now,
        })
        .await?;

    let levels = [
        CourseLevel::Beginner,
        CourseLevel::Intermediate,
        CourseLevel::Advanced,
    ];
    let sources = [
        "https://youtu.be/dQw4w9WgXcQ",
        "https://example.com/handbook/ownership",
        "https://example.com/reference/lifetimes",
    ];

    let mut lesson_total = 0_u32;
    for c in 0..args.courses {
        let course_id = storage
            .courses
            .create_course_in_path(
                path_id,
                NewCourseRecord {
                    title: format!("Course {}", c + 1),
                    description: None,
                    level: Some(levels[(c as usize) % levels.len()]),
                    tags: vec!["rust".into()],
                    created_at: now + Duration::seconds(i64::from(c)),
                },
            )
            .await?;

        for l in 0..args.lessons {
            let idx = (l as usize) % sources.len();
            let kind = if idx == 0 {
                LessonKind::Video
            } else {
                LessonKind::Document
            };
            let lesson_id = storage
                .lessons
                .insert_new_lesson(NewLessonRecord {
                    course_id,
                    title: format!("Lesson {}", l + 1),
                    kind,
                    source: url::Url::parse(sources[idx])?,
                    order_index: l,
                    duration_secs: None,
                    thumbnail: None,
                    created_at: now + Duration::seconds(i64::from(l)),
                })
                .await?;
            lesson_total += 1;

            // First lesson of each course gets some progress so the
            // continuation views have data to show.
            if l == 0 {
                storage.progress.record_position(user, lesson_id, 42, now).await?;
                storage
                    .course_progress
                    .upsert_last_visited(user, course_id, lesson_id, now)
                    .await?;
            }
            if c == 0 && l == 0 {
                storage
                    .progress
                    .set_status(user, lesson_id, LessonStatus::Completed, now)
                    .await?;
            }
        }
    }

    println!(
        "Seeded path {} for user {} with {} courses and {} lessons into {}",
        path_id.value(),
        user,
        args.courses,
        lesson_total,
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
