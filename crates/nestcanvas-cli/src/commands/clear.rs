//! Clear command

use nestcanvas_core::errors::Result;

use super::Context;

pub async fn execute(ctx: &Context) -> Result<()> {
    let session = ctx.session()?;
    session.coordinator.manager().clear().await;
    println!("Cleared saved diagram in {}", ctx.db.display());
    Ok(())
}
