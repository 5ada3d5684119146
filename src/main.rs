use anyhow::Result;

fn main() -> Result<()> {
    detection_watch::run()
}
