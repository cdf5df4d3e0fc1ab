use chrono_tz::Tz;
use dotenvy::dotenv;
use std::env;

#[derive(Clone)]
pub struct Config {
    pub server_addr: String,
    pub database_url: String,

    /// Reference timezone. Period clock times and day keys are anchored to
    /// this single zone; no other offset arithmetic exists anywhere.
    pub timezone: Tz,
    pub schedule_path: String,
    /// Fraction of a period's duration required for a present verdict.
    pub presence_threshold: f64,

    // Rate limiting
    pub rate_scan_per_min: u32,
    pub rate_register_per_min: u32,
    pub rate_read_per_min: u32,

    pub api_prefix: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let timezone: Tz = env::var("TIMEZONE")
            .unwrap_or_else(|_| "Asia/Kolkata".to_string())
            .parse()
            .expect("TIMEZONE must be a valid IANA zone name");

        let presence_threshold: f64 = env::var("PRESENCE_THRESHOLD")
            .unwrap_or_else(|_| "0.10".to_string()) // default 10% of period duration
            .parse()
            .expect("PRESENCE_THRESHOLD must be a number");
        assert!(
            presence_threshold > 0.0 && presence_threshold <= 1.0,
            "PRESENCE_THRESHOLD must be in (0, 1]"
        );

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            timezone,
            schedule_path: env::var("SCHEDULE_PATH").unwrap_or_else(|_| "schedule.json".to_string()),
            presence_threshold,

            rate_scan_per_min: env::var("RATE_SCAN_PER_MIN")
                .unwrap_or_else(|_| "600".to_string())
                .parse()
                .unwrap(),
            rate_register_per_min: env::var("RATE_REGISTER_PER_MIN")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap(),
            rate_read_per_min: env::var("RATE_READ_PER_MIN")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .unwrap(),

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
        }
    }
}
