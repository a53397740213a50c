use anyhow::Result;
use colored::Colorize;

use super::CommandContext;

pub fn handle_show(ctx: &CommandContext, name: String, json: bool) -> Result<()> {
    let loader = ctx.loader()?;
    let checklist = loader.load_checklist(&name)?;

    if json {
        println!("{}", serde_json::to_string_pretty(checklist.as_ref())?);
    } else {
        print!("{}", loader.render_checklist(&checklist));
    }
    Ok(())
}

pub fn handle_source(ctx: &CommandContext, name: String) -> Result<()> {
    let source = ctx.loader()?.get_checklist_source(&name)?;
    println!("{} {}", name.cyan(), source);
    Ok(())
}
