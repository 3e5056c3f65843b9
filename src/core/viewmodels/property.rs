use std::fmt::Debug;
use std::sync::Arc;
use tokio::sync::watch;

/// Receives every value published to a [`Property`].
pub struct PropertySubscriber<T> {
    receiver: watch::Receiver<T>,
}

impl<T: Clone> PropertySubscriber<T> {
    /// Waits for the next published value. Returns `false` once the
    /// property has been dropped.
    pub async fn wait_for_change(&mut self) -> bool {
        self.receiver.changed().await.is_ok()
    }

    /// Latest value, marking it as seen.
    pub fn current(&mut self) -> T {
        self.receiver.borrow_and_update().clone()
    }

    pub fn has_changed(&self) -> bool {
        self.receiver.has_changed().unwrap_or(false)
    }
}

/// Observable value. Writers replace the whole value; readers get clones.
pub struct Property<T: Clone + Send + Sync> {
    sender: Arc<watch::Sender<T>>,
    name: String,
}

impl<T: Clone + Send + Sync> Property<T> {
    pub fn new(initial_value: T, name: impl Into<String>) -> Self {
        let (sender, _) = watch::channel(initial_value);
        Self {
            sender: Arc::new(sender),
            name: name.into(),
        }
    }

    pub fn get(&self) -> T {
        self.sender.borrow().clone()
    }

    pub fn set(&self, new_value: T) {
        self.sender.send_replace(new_value);
    }

    /// Derive the next value from a copy of the current one and publish it.
    pub fn update<F>(&self, updater: F)
    where
        F: FnOnce(&mut T),
    {
        let mut new_value = self.get();
        updater(&mut new_value);
        self.set(new_value);
    }

    pub fn subscribe(&self) -> PropertySubscriber<T> {
        PropertySubscriber {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<T: Clone + Send + Sync> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            name: self.name.clone(),
        }
    }
}

impl<T: Clone + Send + Sync + Debug> Debug for Property<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Property({})", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_property_basic_operations() {
        let prop = Property::new(42, "test_prop");

        assert_eq!(prop.get(), 42);
        assert_eq!(prop.name(), "test_prop");

        prop.set(100);
        assert_eq!(prop.get(), 100);

        prop.update(|v| *v += 1);
        assert_eq!(prop.get(), 101);
    }

    #[tokio::test]
    async fn test_property_subscription() {
        let prop = Property::new("initial".to_string(), "test_prop");
        let mut subscriber = prop.subscribe();
        assert_eq!(prop.subscriber_count(), 1);
        assert!(!subscriber.has_changed());

        let prop_clone = prop.clone();
        tokio::spawn(async move {
            prop_clone.set("changed".to_string());
        });

        assert!(subscriber.wait_for_change().await);
        assert_eq!(subscriber.current(), "changed");
    }

    #[tokio::test]
    async fn test_subscriber_sees_latest_after_many_writes() {
        let prop = Property::new(0, "counter");
        let mut subscriber = prop.subscribe();

        for i in 1..=10 {
            prop.set(i);
        }

        assert!(subscriber.has_changed());
        assert_eq!(subscriber.current(), 10);
        assert!(!subscriber.has_changed());
    }
}
