use clap::Parser;
use es_adapter::config::toml_config::DEFAULT_TASKS_COLLECTION;
use es_adapter::utils::{logger, validation::Validate};
use es_adapter::{
    Adapter, AdapterConfig, CliConfig, Command, ElasticsearchAdapter, ErrorCategory, Store, Task,
    TasksController, TomlConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_logger(config.verbose, logger::LogFormat::from_flag(config.log_json));
    tracing::debug!("CLI config: {:?}", config);

    // 有設定檔時以設定檔為準
    let (adapter_config, collection) = match &config.config {
        Some(path) => {
            let file = TomlConfig::from_file(path)?;
            file.validate()?;
            (
                AdapterConfig::from_provider(&file),
                file.tasks_collection().to_string(),
            )
        }
        None => (
            AdapterConfig::from_provider(&config),
            DEFAULT_TASKS_COLLECTION.to_string(),
        ),
    };

    if let Err(e) = adapter_config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(2);
    }

    tracing::info!("Using elasticsearch at {}", adapter_config.url);
    let adapter = ElasticsearchAdapter::new(adapter_config)?;

    // Ctrl-C 取消進行中的請求
    let token = adapter.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });

    let controller = TasksController::with_collection(Store::new(adapter), &collection);

    if let Err(e) = run(&controller, config.command).await {
        tracing::error!("❌ Command failed: {} (Category: {:?})", e, e.category());
        eprintln!("❌ {}", e.user_friendly_message());

        let exit_code = match e.category() {
            ErrorCategory::Validation | ErrorCategory::Config => 2,
            ErrorCategory::NotFound => 3,
            _ => 1,
        };
        std::process::exit(exit_code);
    }

    Ok(())
}

async fn run<A: Adapter>(controller: &TasksController<A>, command: Command) -> es_adapter::Result<()> {
    match command {
        Command::Add { title } => match controller.create_task(&title).await? {
            Some(task) => println!("✅ Added {}", describe(&task)),
            None => println!("Nothing to add, the title is empty"),
        },
        Command::List => {
            let tasks = controller.load().await?;
            if tasks.is_empty() {
                println!("No tasks yet");
            }
            for task in &tasks {
                println!("{}", describe(task));
            }
        }
        Command::Remaining => {
            controller.load().await?;
            let remaining = controller.remaining().await?;
            println!("{} remaining", remaining.len());
            for task in &remaining {
                println!("{}", describe(task));
            }
        }
        Command::Done { id } => {
            let task = controller.complete_task(&id, true).await?;
            println!("✅ {}", describe(&task));
        }
        Command::Undo { id } => {
            let task = controller.complete_task(&id, false).await?;
            println!("↩️ {}", describe(&task));
        }
        Command::Remove { id } => {
            controller.remove_task(&id).await?;
            println!("🗑️ Removed {}", id);
        }
    }
    Ok(())
}

fn describe(task: &Task) -> String {
    format!(
        "[{}] {}  {}",
        if task.completed { "x" } else { " " },
        task.id.as_deref().unwrap_or("-"),
        task.title
    )
}
