/// Which pane owns plain keystrokes while in navigation mode.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum Focus {
    #[default]
    Sidebar,
    QueryEditor,
    ResultsPane,
    HistoryList,
    FavoritesList,
    SearchBox,
}

/// The main-area tab strip. Switching tabs moves focus but never clears the
/// editor buffer or the stored result.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum Tab {
    #[default]
    Query,
    History,
    Favorites,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Query, Tab::History, Tab::Favorites];

    pub fn label(self) -> &'static str {
        match self {
            Tab::Query => "query",
            Tab::History => "history",
            Tab::Favorites => "favorites",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Tab::Query => 0,
            Tab::History => 1,
            Tab::Favorites => 2,
        }
    }

    pub fn default_focus(self) -> Focus {
        match self {
            Tab::Query => Focus::QueryEditor,
            Tab::History => Focus::HistoryList,
            Tab::Favorites => Focus::FavoritesList,
        }
    }
}
