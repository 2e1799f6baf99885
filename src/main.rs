//! Dependency Graph Sync - Binary Entry Point
//!
//! Command-line client: lists graph files, selects nodes, runs path queries
//! and prints projection summaries. With `--watch` it follows push updates
//! until Ctrl-C.

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use depgraph_sync::{ClientConfig, GraphId, NodeId, PathOutcome, Projection, Session, ViewEvent};

/// Browse a dependency graph server from the terminal
#[derive(Debug, Parser)]
#[command(name = "depgraph-client", version)]
struct Cli {
    /// Graph server base URL (overrides DEPGRAPH_SERVER_URL)
    #[arg(long)]
    server: Option<String>,

    /// Push channel websocket URL (overrides DEPGRAPH_PUSH_URL)
    #[arg(long)]
    push: Option<String>,

    /// Graph file (git hash) to activate instead of the server default
    #[arg(long)]
    graph: Option<String>,

    /// Node ids to select
    #[arg(long = "select", value_name = "NODE")]
    select: Vec<String>,

    /// Include transitive edges
    #[arg(long)]
    transitive: bool,

    /// Find paths between two nodes
    #[arg(long, num_args = 2, value_names = ["FROM", "TO"])]
    path: Option<Vec<String>>,

    /// Keep running and print push updates until Ctrl-C
    #[arg(long)]
    watch: bool,
}

fn summarize(projection: &Projection, transitive: bool) {
    println!(
        "projection: {} nodes, {} edges",
        projection.node_count(),
        projection.visible_edges(transitive).count()
    );
    for node in &projection.nodes {
        println!("  {} ({})", node.id, node.kind);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("depgraph_sync=info,depgraph_client=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env().context("invalid environment configuration")?;
    if let Some(server) = cli.server {
        config.server_url = server;
    }
    if let Some(push) = cli.push {
        config.push_url = Some(push);
    }

    let (session, inbound) = Session::connect(&config)
        .await
        .context("failed to connect to graph server")?;
    tracing::info!(replica = %session.replica(), "connected");

    let files = session.load_graph_files().await.context("failed to list graph files")?;
    for file in &files {
        let marker = if file.selected { "*" } else { " " };
        println!("{} {:>3} {}", marker, file.id, file.git);
    }

    if let Some(graph) = cli.graph {
        session.select_graph(GraphId::from(graph)).await?;
    }
    let Some(graph) = session.snapshot().graph().cloned() else {
        anyhow::bail!("no graph file is active; pass --graph");
    };
    println!("graph: {}", graph);

    if cli.transitive {
        let _ = session.set_transitive(true);
    }
    for id in &cli.select {
        let _ = session.select_node(&NodeId::from(id.as_str()), true)?;
    }

    if let Some(endpoints) = cli.path {
        let (from, to) = (NodeId::from(endpoints[0].as_str()), NodeId::from(endpoints[1].as_str()));
        match session.find_path(from, to).await? {
            PathOutcome::Ready { paths, projection } => {
                for (i, path) in paths.paths.iter().enumerate() {
                    let hops: Vec<&str> = path.iter().map(NodeId::as_str).collect();
                    println!("path {}: {}", i, hops.join(" -> "));
                }
                if let Some(projection) = projection {
                    projection.await?;
                }
            }
            PathOutcome::Superseded => {}
        }
    }

    if let Some(projection) = session.projection() {
        let projection = projection.await?;
        summarize(&projection, cli.transitive);
    }

    if !cli.watch {
        return Ok(());
    }

    let Some(inbound) = inbound else {
        anyhow::bail!("--watch needs a push channel; pass --push or set DEPGRAPH_PUSH_URL");
    };
    let mut updates = session.subscribe();
    let runner = session.clone();
    tokio::spawn(async move {
        runner
            .run(tokio_stream::wrappers::UnboundedReceiverStream::new(inbound))
            .await
    });

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted");
                break;
            }
            update = updates.recv() => {
                let Ok(update) = update else { continue };
                match update.event {
                    ViewEvent::ProjectionReady { .. } => {
                        if let Some(projection) = session.view().projection {
                            summarize(&projection, session.snapshot().transitive());
                        }
                    }
                    ViewEvent::ProjectionFailed { error, .. } => eprintln!("projection failed: {}", error),
                    ViewEvent::GraphSelected { graph } => println!("graph: {}", graph),
                    ViewEvent::SelectionChanged { revision, .. } => {
                        println!("selection #{}: {} nodes", revision, session.snapshot().selected().len());
                    }
                    _ => {}
                }
            }
        }
    }

    Ok(())
}
