use crate::orchestrator::types::FeedPost;

/// 信息流的展示快照。服务端按投稿顺序返回，这里反转为最新在前。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimelineView {
    posts: Vec<FeedPost>,
}

impl TimelineView {
    pub fn from_feed(mut posts: Vec<FeedPost>) -> Self {
        posts.reverse();
        Self { posts }
    }

    pub fn posts(&self) -> &[FeedPost] {
        &self.posts
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}
