fn main() -> anyhow::Result<()> {
    roots_cli::run()
}
