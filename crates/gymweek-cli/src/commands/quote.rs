use gymweek_core::quotes::{QuoteService, QuoteSource};

use crate::commands::common::AppContext;
use crate::error::CliError;

pub async fn run_quote(context: AppContext) -> Result<(), CliError> {
    let service = QuoteService::new(&context.config)?;
    println!("{}", service.fetch_quote(None).await);
    Ok(())
}
