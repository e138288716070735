fn main() -> Result<(), anyhow::Error> {
    lockstep::run()
}
