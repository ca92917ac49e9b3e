//! Emits the OpenAPI document as pretty JSON on stdout.

use pickem_back::services::documentation::ApiDoc;
use utoipa::OpenApi;

/// Print the OpenAPI document so it can be published without starting the server.
fn main() -> anyhow::Result<()> {
    let doc = ApiDoc::openapi();
    println!("{}", doc.to_pretty_json()?);
    Ok(())
}
