use std::collections::HashMap;
use std::sync::Mutex;

use futures::future::BoxFuture;

use crate::application::TabLookup;
use crate::domain::RelayError;

/// Tab titles as last reported by the browser.
#[derive(Debug, Default)]
pub struct TabRegistry {
    titles: Mutex<HashMap<i64, String>>,
}

impl TabRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&self, tab_id: i64, title: String) {
        if let Ok(mut titles) = self.titles.lock() {
            titles.insert(tab_id, title);
        }
    }

    pub fn remove(&self, tab_id: i64) {
        if let Ok(mut titles) = self.titles.lock() {
            titles.remove(&tab_id);
        }
    }
}

impl TabLookup for TabRegistry {
    fn title(&self, tab_id: i64) -> BoxFuture<'_, Result<Option<String>, RelayError>> {
        Box::pin(async move {
            let titles = self
                .titles
                .lock()
                .map_err(|_| RelayError::TabNotFound(tab_id))?;
            match titles.get(&tab_id) {
                Some(title) if title.is_empty() => Ok(None),
                Some(title) => Ok(Some(title.clone())),
                None => Err(RelayError::TabNotFound(tab_id)),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_title_lookup() {
        let tabs = TabRegistry::new();
        tabs.update(3, "Lecture 1".into());
        tabs.update(4, String::new());

        assert_eq!(tabs.title(3).await.unwrap().as_deref(), Some("Lecture 1"));
        assert_eq!(tabs.title(4).await.unwrap(), None);
        assert!(matches!(
            tabs.title(5).await,
            Err(RelayError::TabNotFound(5))
        ));

        tabs.remove(3);
        assert!(tabs.title(3).await.is_err());
    }
}
