use actix_web::{middleware::Logger, web, App, HttpServer};
use clap::Parser;
use log::info;

use student_result_predictor::api::{self, AppState};
use student_result_predictor::config::Cli;
use student_result_predictor::data::class_distribution;
use student_result_predictor::persistence::load_or_build;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let (samples, source) = cli.data_source().load()?;
    let (pass_count, fail_count) = class_distribution(&samples);
    info!("Class distribution: {} Pass, {} Fail", pass_count, fail_count);

    let config = cli.kernel_config()?;
    info!("Decision policy: {}", config.policy);
    let store = cli.model_store();
    let (kernel, loaded_from_cache) = load_or_build(&samples, config, store.as_ref(), cli.retrain)?;

    let evaluation = kernel.evaluation();
    info!(
        "Model ready: accuracy {:.2}%, R² {:.3}",
        evaluation.accuracy * 100.0,
        evaluation.r2
    );

    let state = web::Data::new(AppState {
        kernel,
        samples,
        data_source: source.to_string(),
        loaded_from_cache,
    });

    let (host, port) = cli.bind_address();
    info!("Starting Student Result Predictor API on http://{}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(api::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await?;

    Ok(())
}
