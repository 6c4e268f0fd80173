use anyhow::Context;

fn main() -> anyhow::Result<()> {
    kardex::cli::run().context("kardex shell terminated on a fatal store error")
}
