//! Administrative tasks that have no web surface.
//!
//! ```bash
//! trainerhub-admin create-user --username alice --password secret --staff
//! trainerhub-admin create-trainer --username bob --specialization Yoga \
//!     --experience-years 5 --hourly-rate 45.00 --bio "Flexibility coach"
//! trainerhub-admin seed-health-data --username user1
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use rust_decimal::{prelude::FromPrimitive, Decimal};
use sqlx::PgPool;
use time::{macros::format_description, Date, Duration, Time, UtcOffset};
use tracing::info;

use trainerhub::{
    auth::{repo_types::NewUser, services::hash_password, User},
    config::parse_utc_offset,
    metrics::{
        repo::{delete_in_range, weight_summary},
        sleep::{format_duration, SleepWindow},
        MetricsStore, NewHealthMetric, PgMetricsStore,
    },
    trainers::{repo as trainer_repo, repo_types::NewTrainerProfile},
};

#[derive(Parser)]
#[command(name = "trainerhub-admin", about = "TrainerHub administration")]
struct Cli {
    /// Database URL override (defaults to DATABASE_URL)
    #[arg(long)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a login account
    CreateUser {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
        #[arg(long)]
        staff: bool,
        #[arg(long)]
        superuser: bool,
    },
    /// Attach a trainer profile to an existing account
    CreateTrainer {
        #[arg(long)]
        username: String,
        #[arg(long)]
        specialization: String,
        #[arg(long)]
        experience_years: i32,
        #[arg(long)]
        hourly_rate: Decimal,
        #[arg(long, default_value = "")]
        bio: String,
        #[arg(long)]
        unavailable: bool,
    },
    /// Replace a user's records in a date range with generated demo data
    SeedHealthData {
        #[arg(long, default_value = "user1")]
        username: String,
        #[arg(long, default_value = "2025-10-15", value_parser = parse_date)]
        from: Date,
        #[arg(long, default_value = "2025-10-30", value_parser = parse_date)]
        to: Date,
    },
}

fn parse_date(raw: &str) -> Result<Date> {
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .with_context(|| format!("expected YYYY-MM-DD, got `{}`", raw))
}

const SLEEP_TIMES: [(u8, u8); 8] = [
    (21, 30),
    (22, 0),
    (22, 15),
    (22, 30),
    (22, 45),
    (23, 0),
    (23, 15),
    (23, 30),
];
const WAKE_TIMES: [(u8, u8); 7] = [(6, 0), (6, 30), (7, 0), (7, 15), (7, 30), (8, 0), (8, 15)];

const BASE_WEIGHT: f64 = 75.0;
const BASE_THIGH: f64 = 58.0;
const BASE_HIP: f64 = 95.0;

/// One generated day of demo data.
struct SampleDay {
    weight: Decimal,
    thigh_length: Decimal,
    hip_length: Decimal,
    sleep: Time,
    wake: Time,
}

fn two_dp(v: f64) -> Result<Decimal> {
    Decimal::from_f64(v)
        .map(|d| d.round_dp(2))
        .with_context(|| format!("{} is not representable", v))
}

/// Weight drifts down 0.1 kg a day; measurements follow a fraction of it.
fn sample_day<R: Rng>(rng: &mut R, days_passed: i64) -> Result<SampleDay> {
    let trend = -0.1 * days_passed as f64;
    let (sh, sm) = *SLEEP_TIMES.choose(rng).context("sleep times")?;
    let (wh, wm) = *WAKE_TIMES.choose(rng).context("wake times")?;
    Ok(SampleDay {
        weight: two_dp(BASE_WEIGHT + trend + rng.gen_range(-0.5..=0.5))?,
        thigh_length: two_dp(BASE_THIGH + trend * 0.2 + rng.gen_range(-0.5..=0.5))?,
        hip_length: two_dp(BASE_HIP + trend * 0.3 + rng.gen_range(-1.0..=1.0))?,
        sleep: Time::from_hms(sh, sm, 0)?,
        wake: Time::from_hms(wh, wm, 0)?,
    })
}

async fn create_user(db: &PgPool, new: NewUser, password: &str) -> Result<User> {
    if User::find_by_username(db, &new.username).await?.is_some() {
        bail!("user `{}` already exists", new.username);
    }
    let hash = hash_password(password)?;
    User::create(db, &new, &hash).await
}

async fn seed_health_data(
    db: &PgPool,
    username: &str,
    from: Date,
    to: Date,
    offset: UtcOffset,
) -> Result<()> {
    if to < from {
        bail!("--to {} is before --from {}", to, from);
    }

    let user = match User::find_by_username(db, username).await? {
        Some(u) => u,
        None => {
            let new = NewUser {
                username: username.to_string(),
                first_name: "John".into(),
                last_name: "Doe".into(),
                email: "john.doe@example.com".into(),
                ..NewUser::default()
            };
            let u = create_user(db, new, "123").await?;
            println!("Created user: {}", u.username);
            u
        }
    };

    let removed = delete_in_range(db, user.id, from, to).await?;
    info!(user_id = %user.id, removed, "cleared seed range");

    let store = PgMetricsStore::new(db.clone());
    let mut rng = StdRng::from_entropy();
    let mut current = from;
    let mut created = 0;
    while current <= to {
        let day = sample_day(&mut rng, (current - from).whole_days())?;
        let window = SleepWindow::on_date(current, day.sleep, day.wake, offset);
        store
            .upsert(NewHealthMetric {
                user_id: user.id,
                recorded_date: current,
                weight: day.weight,
                thigh_length: day.thigh_length,
                hip_length: day.hip_length,
                sleeping_at: window.sleeping_at,
                wakeup_at: window.wakeup_at,
                image_key: None,
            })
            .await?;
        created += 1;
        println!(
            "Created entry for {}: Weight={}kg, Sleep={:02}:{:02}, Wake={:02}:{:02}, Sleep Duration={}",
            current,
            day.weight,
            day.sleep.hour(),
            day.sleep.minute(),
            day.wake.hour(),
            day.wake.minute(),
            format_duration(window.duration()),
        );
        current += Duration::days(1);
    }

    println!("Successfully created {} health metric entries from {} to {}", created, from, to);

    let (total, avg) = weight_summary(db, user.id).await?;
    println!("\nSummary for {}:", user.username);
    println!("- Total entries: {}", total);
    match avg {
        Some(avg) => println!("- Average weight: {}kg", avg.round_dp(2)),
        None => println!("- Average weight: N/A"),
    }
    println!("- Date range: {} to {}", from, to);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    trainerhub::init_tracing("trainerhub=info,sqlx=warn");

    let cli = Cli::parse();
    let database_url = match cli.database_url {
        Some(url) => url,
        None => std::env::var("DATABASE_URL").context("DATABASE_URL")?,
    };
    let offset = match std::env::var("APP_UTC_OFFSET") {
        Ok(raw) => parse_utc_offset(&raw).context("APP_UTC_OFFSET")?,
        Err(_) => UtcOffset::UTC,
    };

    let db = sqlx::postgres::PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&db).await?;

    match cli.command {
        Command::CreateUser {
            username,
            password,
            email,
            first_name,
            last_name,
            staff,
            superuser,
        } => {
            let new = NewUser {
                username,
                first_name,
                last_name,
                email,
                is_staff: staff,
                is_superuser: superuser,
            };
            let user = create_user(&db, new, &password).await?;
            println!("Created user {} ({})", user.username, user.id);
        }
        Command::CreateTrainer {
            username,
            specialization,
            experience_years,
            hourly_rate,
            bio,
            unavailable,
        } => {
            let user = User::find_by_username(&db, &username)
                .await?
                .with_context(|| format!("no user `{}`", username))?;
            if trainer_repo::find_by_user(&db, user.id).await?.is_some() {
                bail!("`{}` already has a trainer profile", username);
            }
            let id = trainer_repo::create(
                &db,
                &NewTrainerProfile {
                    user_id: user.id,
                    specialization,
                    experience_years,
                    hourly_rate: hourly_rate.round_dp(2),
                    bio,
                    is_available: !unavailable,
                },
            )
            .await?;
            let profile = trainer_repo::find_by_id(&db, id)
                .await?
                .with_context(|| format!("trainer profile {} vanished after insert", id))?;
            println!("Created trainer profile {} ({})", profile.display_name(), profile.id);
        }
        Command::SeedHealthData { username, from, to } => {
            seed_health_data(&db, &username, from, to, offset).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_days_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for days in 0..16 {
            let d = sample_day(&mut rng, days).unwrap();
            let trend = Decimal::new(-days, 1);
            let base = Decimal::new(750, 1) + trend;
            assert!(d.weight >= base - Decimal::new(5, 1) && d.weight <= base + Decimal::new(5, 1));
            assert!(d.weight.scale() <= 2);
            assert!(SLEEP_TIMES.contains(&(d.sleep.hour(), d.sleep.minute())));
            assert!(WAKE_TIMES.contains(&(d.wake.hour(), d.wake.minute())));
        }
    }

    #[test]
    fn seeded_windows_read_as_overnight() {
        let w = SleepWindow::on_date(
            time::macros::date!(2025-10-15),
            time::macros::time!(22:30),
            time::macros::time!(6:30),
            UtcOffset::UTC,
        );
        assert_eq!(format_duration(w.duration()), "8h");
    }

    #[test]
    fn date_arguments_parse() {
        assert_eq!(parse_date("2025-10-15").unwrap(), time::macros::date!(2025-10-15));
        assert!(parse_date("15/10/2025").is_err());
    }
}
