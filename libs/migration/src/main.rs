use migration::Migrator;
use sea_orm_migration::cli;

/// `cargo run -p migration -- up` applies the catalog schema to `DATABASE_URL`.
#[tokio::main]
async fn main() {
    cli::run_cli(Migrator).await;
}
