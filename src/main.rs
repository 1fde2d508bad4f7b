use joinery_core::Variant;
use stress_test::{stress_test, stress_test_scaling, StressConfig, StressError};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), StressError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async_main())
}

async fn async_main() -> Result<(), StressError> {
    // Run async stress tests
    println!("\n\n╔════════════════════════════════════════════════════════════╗");
    println!("║            ASYNC STRESS TESTS                               ║");
    println!("╚════════════════════════════════════════════════════════════╝");

    // Every variant at small scale
    for variant in Variant::ALL {
        let stats = stress_test(variant, &StressConfig::small()).await?;
        stats.print();
    }

    // The set variants at medium scale
    for variant in [Variant::GSet, Variant::AWSet, Variant::ORSet] {
        let stats = stress_test(variant, &StressConfig::medium()).await?;
        stats.print();
    }

    println!("\n\n╔════════════════════════════════════════════════════════════╗");
    println!("║          SCALING ANALYSIS (AW-Set)                          ║");
    println!("╚════════════════════════════════════════════════════════════╝");
    stress_test_scaling(Variant::AWSet, 8, 2).await?;

    println!("\n✓ All stress tests completed successfully!");
    Ok(())
}
