//! Load a course into the database, replacing the current curriculum.
//!
//! Usage: `seed [course.json]`. Without a path the bundled C++ course is used.

use anyhow::Context;

use learntocode_backend::config::Config;
use learntocode_backend::seed::{self, Course};
use learntocode_backend::{connect_and_migrate, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing();

    let course = match std::env::args().nth(1) {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {path}"))?;
            Course::from_json(&text).with_context(|| format!("Failed to parse {path}"))?
        }
        None => Course::bundled()?,
    };

    let db = connect_and_migrate(&config).await?;
    seed::seed(&db, &course).await
}
