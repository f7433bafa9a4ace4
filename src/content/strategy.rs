/// Per-platform knowledge of where posts, their text and their actions live

use std::collections::HashMap;

use super::DomNode;
use crate::platform::Platform;

pub trait PostStrategy<N: DomNode> {
    /// Every post container under `root`
    fn posts(&self, root: &N) -> Vec<N>;

    /// The node holding the post's claim text
    fn claim_node(&self, post: &N) -> Option<N>;

    /// Where the control goes
    fn action_row(&self, post: &N) -> Option<N>;

    /// The post containing `node`
    fn post_of(&self, node: &N) -> Option<N>;
}

/// Tweets on twitter.com / x.com
pub struct TwitterStrategy;

impl TwitterStrategy {
    const POST: &'static str = r#"article[data-testid="tweet"]"#;
    const TEXT: &'static str = r#"[data-testid="tweetText"]"#;
    const ACTIONS: &'static str = r#"[role="group"]"#;
}

impl<N: DomNode> PostStrategy<N> for TwitterStrategy {
    fn posts(&self, root: &N) -> Vec<N> {
        root.select_all(Self::POST)
    }

    fn claim_node(&self, post: &N) -> Option<N> {
        post.select(Self::TEXT)
    }

    fn action_row(&self, post: &N) -> Option<N> {
        post.select(Self::ACTIONS)
    }

    fn post_of(&self, node: &N) -> Option<N> {
        node.closest(Self::POST)
    }
}

/// A recognized platform whose markup is not handled yet
pub struct NoopStrategy(pub Platform);

impl<N: DomNode> PostStrategy<N> for NoopStrategy {
    fn posts(&self, _root: &N) -> Vec<N> {
        Vec::new()
    }

    fn claim_node(&self, _post: &N) -> Option<N> {
        None
    }

    fn action_row(&self, _post: &N) -> Option<N> {
        None
    }

    fn post_of(&self, _node: &N) -> Option<N> {
        None
    }
}

pub struct StrategyRegistry<N> {
    strategies: HashMap<Platform, Box<dyn PostStrategy<N>>>,
    fallback: NoopStrategy,
}

impl<N: DomNode> StrategyRegistry<N> {
    pub fn empty() -> Self {
        StrategyRegistry {
            strategies: HashMap::new(),
            fallback: NoopStrategy(Platform::Unknown),
        }
    }

    pub fn register(&mut self, platform: Platform, strategy: Box<dyn PostStrategy<N>>) {
        self.strategies.insert(platform, strategy);
    }

    /// Strategy for a platform; unregistered platforms get a no-op
    pub fn get(&self, platform: Platform) -> &dyn PostStrategy<N> {
        match self.strategies.get(&platform) {
            Some(strategy) => strategy.as_ref(),
            None => &self.fallback,
        }
    }
}

impl<N: DomNode + 'static> Default for StrategyRegistry<N> {
    fn default() -> Self {
        let mut registry = StrategyRegistry::empty();
        registry.register(Platform::Twitter, Box::new(TwitterStrategy));
        for platform in [
            Platform::Facebook,
            Platform::Instagram,
            Platform::Tiktok,
            Platform::Reddit,
        ] {
            registry.register(platform, Box::new(NoopStrategy(platform)));
        }
        registry
    }
}
