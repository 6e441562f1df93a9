fn main() -> anyhow::Result<()> {
    calcflow::run()
}
