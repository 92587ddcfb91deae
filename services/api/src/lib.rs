mod browse;
mod cli;
mod infra;
mod routes;
mod server;

use lehrstellen::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
