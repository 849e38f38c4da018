// main.rs

use std::{sync::Arc, time};

use clap::{Parser, ValueEnum};
use rayon::ThreadPoolBuilder;
use tokio::runtime;
use tracing::{info, instrument, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, Layer};

mod decoders;
mod egress;
mod encoders;
mod handlers;
mod ingress;
mod metrics;
mod processing;
mod router;
mod services;
mod types;

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, ValueEnum)]
enum LogLevel {
    Trace = 0, // Designates very fine-grained informational events, extremely verbose.
    Debug = 1, // Designates fine-grained informational events.
    Info = 2,  // Designates informational messages.
    Warn = 3,  // Designates hazardous situations.
    Error = 4, // Designates very serious errors.
}

#[derive(Parser, Debug)]
#[command(author, version, about = "pc-filter")]
struct Args {
    // Set the port number
    #[arg(short, long, default_value = "3001")]
    port: u16,
    // Set the log level (possible values: error, warn, info, debug, trace)
    #[arg(short, long, default_value = "info")]
    log_level: LogLevel,
    /// Intensity threshold in effect at startup
    #[arg(short, long, default_value_t = 100.0)]
    intensity_threshold: f64,
}

#[instrument(skip_all)]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments
    let args = Args::parse();

    // Build the FmtSubscriber layer
    let fmt_layer = tracing_subscriber::fmt::layer()
        .pretty()
        .compact()
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_filter(match args.log_level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        });

    // Initialize console tracing if enabled
    #[cfg(feature = "console-tracing")]
    let subscriber = {
        let console_layer = console_subscriber::ConsoleLayer::builder()
            .retention(std::time::Duration::from_secs(60))
            .server_addr(([127, 0, 0, 1], 5556))
            .spawn();
        let tracy_layer = tracing_tracy::TracyLayer::default();
        tracing_subscriber::registry()
            .with(console_layer)
            .with(tracy_layer)
            .with(fmt_layer)
    };

    #[cfg(not(feature = "console-tracing"))]
    let subscriber = { tracing_subscriber::registry().with(fmt_layer) };

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global default subscriber");

    info!("{:?}", args);

    let runtime = runtime::Builder::new_multi_thread()
        .thread_name_fn(|| {
            static ATOMIC_MAIN_ID: std::sync::atomic::AtomicUsize =
                std::sync::atomic::AtomicUsize::new(0);
            let id = ATOMIC_MAIN_ID.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            format!("MAIN_R w-{}", id)
        })
        .enable_all()
        .build()
        .unwrap();

    // Single worker: frames are filtered strictly one after another, so a
    // frame always runs to completion before the next one is accepted.
    let thread_pool = Arc::new(
        ThreadPoolBuilder::new()
            .thread_name(|i| format!("Frame w-{}", i + 1))
            .num_threads(1)
            .build()
            .expect("Failed to build thread pool"),
    );

    // Build the metrics instance
    metrics::MetricsBuilder::new().add_label("mode", "filter").build();

    // Initialize services
    let topic_manager = Arc::new(services::topic_manager::TopicManager::new());
    let config_store = Arc::new(services::config_store::ConfigStore::new(
        args.intensity_threshold,
    ));
    let processing_pipeline = Arc::new(processing::ProcessingPipeline::new(
        thread_pool.clone(),
        config_store.clone(),
    ));

    // Initialize singleton egress protocols
    egress::initialize_egress_protocols(topic_manager.clone());

    // Initialize singleton ingress protocols
    ingress::initialize_ingress_protocols(topic_manager.clone(), processing_pipeline.clone());

    // Create router
    let app = router::create_router(
        topic_manager.clone(),
        config_store.clone(),
        processing_pipeline.clone(),
    );

    runtime.block_on(async move {
        let addr: std::net::SocketAddr = format!("0.0.0.0:{}", args.port).parse().unwrap();
        let sock = socket2::Socket::new(
            match addr {
                std::net::SocketAddr::V4(_) => socket2::Domain::IPV4,
                std::net::SocketAddr::V6(_) => socket2::Domain::IPV6,
            },
            socket2::Type::STREAM, // Will become SOCK_CLOEXEC internally on Linux
            None,
        )
        .unwrap();

        sock.set_reuse_address(true).unwrap();
        #[cfg(unix)]
        sock.set_reuse_port(true).unwrap();
        sock.set_nonblocking(true).unwrap();
        sock.bind(&addr.into()).unwrap();
        sock.listen(1024).unwrap();

        let listener = tokio::net::TcpListener::from_std(sock.into()).unwrap();

        axum::serve(listener, app).await.unwrap();
    });

    info!("Server started");

    loop {
        std::thread::sleep(time::Duration::from_secs(1));
    }

    #[allow(unreachable_code)]
    Ok(())
}
