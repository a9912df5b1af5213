/// weekly loan - originate, pay every week on time, finish the loan
use chrono::{Duration, TimeZone, Utc};
use loan_billing_rs::{
    BillingConfig, BillingService, Borrower, InMemoryLoanStore, JsonView, Money, SafeTimeProvider,
    TimeSource,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "loan_billing_rs=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
    ));
    let controller = time.test_control().unwrap();

    let mut store = InMemoryLoanStore::new();
    let borrower = store.register_borrower(Borrower::new(
        "Budi",
        "Santoso",
        "budi@example.com",
        "+62 811 0000 001",
        time.now(),
    ));

    let mut service = BillingService::new(store, BillingConfig::weekly_flat(), &time)?;

    // 5,000,000 at 10% flat over 50 weeks
    let loan = service.create_loan(borrower, Money::from_major(5_000_000))?;
    println!("{}", loan.to_json_pretty()?);

    for week in 1..=50 {
        controller.advance(Duration::days(7));
        let receipt = service.make_payment(loan.id, loan.installment_amount)?;
        if week % 10 == 0 {
            println!("week {}: remaining {}", week, receipt.remaining_due);
        }
    }

    println!("{}", service.get_loan(loan.id)?.to_json_pretty()?);
    println!("{}", service.get_outstanding(loan.id)?.to_json_pretty()?);
    println!("events recorded: {}", service.take_events().len());

    Ok(())
}
