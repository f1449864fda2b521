use stipple::Settings;

fn main() -> anyhow::Result<()> {
    stipple::run(Settings::default())
}
