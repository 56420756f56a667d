use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::KeyEvent;
use ratatui::prelude::Rect;
use tokio::sync::mpsc::{self, UnboundedSender};

use crate::{
  action::Action,
  catalog::{CatalogClient, HttpCatalogClient, HttpQueryClient, QueryClient},
  cli::Cli,
  components::{browser::Browser, Component},
  config::Config,
  history::{FavoriteStore, HistoryStore},
  mode::Mode,
  tui, utils,
};

pub struct App {
  pub config: Config,
  pub tick_rate: f64,
  pub frame_rate: f64,
  pub components: Vec<Box<dyn Component>>,
  pub should_quit: bool,
  pub should_suspend: bool,
  pub mode: Mode,
  pub last_tick_key_events: Vec<KeyEvent>,
  catalog: Arc<dyn CatalogClient>,
  query: Arc<dyn QueryClient>,
  startup_query: Option<String>,
}

impl App {
  pub fn new(cli: &Cli) -> Result<Self> {
    let mut config = Config::new()?;
    cli.apply_to(&mut config.session);
    let session = config.session.clone();

    let data_dir = utils::get_data_dir();
    let history = HistoryStore::load(Some(data_dir.join("history.jsonl")));
    let favorites = FavoriteStore::load(Some(data_dir.join("favorites.json")));
    let browser = Browser::new(history, favorites);

    let catalog: Arc<dyn CatalogClient> = Arc::new(HttpCatalogClient::new(session.clone()));
    let query: Arc<dyn QueryClient> = Arc::new(HttpQueryClient::new(session));

    Ok(Self {
      config,
      tick_rate: cli.tick_rate,
      frame_rate: cli.frame_rate,
      components: vec![Box::new(browser)],
      should_quit: false,
      should_suspend: false,
      mode: Mode::Navigation,
      last_tick_key_events: Vec::new(),
      catalog,
      query,
      startup_query: cli.execute.clone(),
    })
  }

  pub async fn run(&mut self) -> Result<()> {
    let (action_tx, mut action_rx) = mpsc::unbounded_channel();

    let mut tui = tui::Tui::new()?.tick_rate(self.tick_rate).frame_rate(self.frame_rate);
    tui.enter()?;

    for component in self.components.iter_mut() {
      component.register_action_handler(action_tx.clone())?;
    }

    for component in self.components.iter_mut() {
      component.register_config_handler(self.config.clone())?;
    }

    for component in self.components.iter_mut() {
      component.init(Rect::default())?;
    }

    action_tx.send(Action::LoadNamespaces)?;
    if let Some(sql) = self.startup_query.take() {
      action_tx.send(Action::SetQueryText(sql))?;
      action_tx.send(Action::ExecuteQuery)?;
    }

    loop {
      if let Some(e) = tui.next().await {
        match e {
          tui::Event::Quit => action_tx.send(Action::Quit)?,
          tui::Event::Tick => action_tx.send(Action::Tick)?,
          tui::Event::Render => action_tx.send(Action::Render)?,
          tui::Event::Resize(x, y) => action_tx.send(Action::Resize(x, y))?,
          tui::Event::Key(key) => {
            if let Some(keymap) = self.config.keybindings.get(&self.mode) {
              if let Some(action) = keymap.get(&vec![key]) {
                log::info!("Got action: {action:?}");
                action_tx.send(action.clone())?;
              } else {
                // If the key was not handled as a single key action,
                // then consider it for multi-key combinations.
                self.last_tick_key_events.push(key);

                if let Some(action) = keymap.get(&self.last_tick_key_events) {
                  log::info!("Got action: {action:?}");
                  action_tx.send(action.clone())?;
                }
              }
            };
          },
          _ => {},
        }
        for component in self.components.iter_mut() {
          if let Some(action) = component.handle_events(Some(e.clone()))? {
            action_tx.send(action)?;
          }
        }
      }

      while let Ok(action) = action_rx.try_recv() {
        if action != Action::Tick && action != Action::Render {
          log::debug!("{action:?}");
        }
        match action {
          Action::Tick => {
            self.last_tick_key_events.drain(..);
          },
          Action::Quit => self.should_quit = true,
          Action::Suspend => self.should_suspend = true,
          Action::Resume => self.should_suspend = false,
          Action::ModeChanged(mode) => self.mode = mode,
          Action::Resize(w, h) => {
            tui.resize(Rect::new(0, 0, w, h))?;
            tui.draw(|f| {
              for component in self.components.iter_mut() {
                let r = component.draw(f, f.area());
                if let Err(e) = r {
                  action_tx.send(Action::Error(format!("Failed to draw: {e:?}"))).unwrap();
                }
              }
            })?;
          },
          Action::Render => {
            tui.draw(|f| {
              for component in self.components.iter_mut() {
                let r = component.draw(f, f.area());
                if let Err(e) = r {
                  action_tx.send(Action::Error(format!("Failed to draw: {e:?}"))).unwrap();
                }
              }
            })?;
          },
          Action::LoadNamespaces => {
            load_namespaces(action_tx.clone(), self.catalog.clone());
          },
          Action::NamespacesLoaded(ref namespaces) => {
            // Prefetch every namespace's tables so expanding is instant and
            // completion knows the whole catalog.
            for namespace in namespaces {
              load_tables(action_tx.clone(), self.catalog.clone(), namespace.clone());
            }
          },
          Action::LoadTables(ref namespace) => {
            load_tables(action_tx.clone(), self.catalog.clone(), namespace.clone());
          },
          Action::LoadTableMetadata(ref namespace, ref table) => {
            load_table_metadata(action_tx.clone(), self.catalog.clone(), namespace.clone(), table.clone());
          },
          Action::HandleQuery(epoch, ref sql) => {
            execute_query(action_tx.clone(), self.query.clone(), epoch, sql.clone());
          },
          _ => {},
        }
        for component in self.components.iter_mut() {
          if let Some(action) = component.update(action.clone())? {
            action_tx.send(action)?
          };
        }
      }

      if self.should_suspend {
        tui.suspend()?;
        action_tx.send(Action::Resume)?;
        tui = tui::Tui::new()?.tick_rate(self.tick_rate).frame_rate(self.frame_rate);
        tui.enter()?;
      } else if self.should_quit {
        tui.stop()?;
        break;
      }
    }
    tui.exit()?;
    Ok(())
  }
}

fn load_namespaces(tx: UnboundedSender<Action>, catalog: Arc<dyn CatalogClient>) {
  tokio::spawn(async move {
    let action = match catalog.list_namespaces().await {
      Ok(namespaces) => Action::NamespacesLoaded(namespaces),
      Err(e) => Action::Error(format!("loading namespaces failed: {e}")),
    };
    let _ = tx.send(action);
  });
}

fn load_tables(tx: UnboundedSender<Action>, catalog: Arc<dyn CatalogClient>, namespace: String) {
  tokio::spawn(async move {
    let action = match catalog.list_tables(&namespace).await {
      Ok(tables) => Action::TablesLoaded(namespace, tables),
      Err(e) => Action::TableListFailed(namespace, e.to_string()),
    };
    let _ = tx.send(action);
  });
}

fn load_table_metadata(tx: UnboundedSender<Action>, catalog: Arc<dyn CatalogClient>, namespace: String, table: String) {
  tokio::spawn(async move {
    let action = match catalog.get_table_metadata(&namespace, &table).await {
      Ok(meta) => Action::TableMetadataLoaded(namespace, table, meta),
      Err(e) => Action::Error(format!("loading {namespace}.{table} failed: {e}")),
    };
    let _ = tx.send(action);
  });
}

fn execute_query(tx: UnboundedSender<Action>, query: Arc<dyn QueryClient>, epoch: u64, sql: String) {
  tokio::spawn(async move {
    let action = match query.execute(&sql).await {
      Ok(result) => Action::QueryResultReady(epoch, Box::new(result)),
      Err(e) => Action::QueryFailed(epoch, e.to_string()),
    };
    let _ = tx.send(action);
  });
}
