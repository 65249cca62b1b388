fn main() -> anyhow::Result<()> {
    memely::run()?;
    Ok(())
}
