fn main() -> anyhow::Result<()> {
    phonosynth::cli::run()
}
