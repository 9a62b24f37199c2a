// Response shapes of the list endpoints, decoded once at the client boundary

use agentdeck_types::{AgentSummary, ConversationPage, ConversationSummary, Pagination};
use serde::Deserialize;

use crate::traits::PageRequest;

/// `GET /conversations` answers in one of three shapes depending on the
/// server version. Variant order matters for untagged decoding.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ConversationListResponse {
    Paginated {
        conversations: Vec<ConversationSummary>,
        pagination: Pagination,
    },
    Unpaginated {
        conversations: Vec<ConversationSummary>,
    },
    Bare(Vec<ConversationSummary>),
}

impl ConversationListResponse {
    /// Normalize into a page, filling pagination gaps from the request
    pub fn into_page(self, request: PageRequest) -> ConversationPage {
        match self {
            ConversationListResponse::Paginated {
                conversations,
                pagination,
            } => {
                let total = if pagination.total == 0 {
                    conversations.len() as u64
                } else {
                    pagination.total
                };
                let page_size = if pagination.page_size == 0 {
                    request.page_size
                } else {
                    pagination.page_size
                };
                let total_pages = if pagination.total_pages == 0 {
                    u32::try_from(total.div_ceil(u64::from(page_size.max(1))))
                        .unwrap_or(u32::MAX)
                } else {
                    pagination.total_pages
                };

                ConversationPage {
                    items: conversations,
                    pagination: Pagination {
                        page: if pagination.page == 0 { request.page } else { pagination.page },
                        page_size,
                        total,
                        total_pages,
                    },
                }
            }
            ConversationListResponse::Unpaginated { conversations }
            | ConversationListResponse::Bare(conversations) => unpaginated(conversations, request),
        }
    }
}

fn unpaginated(items: Vec<ConversationSummary>, request: PageRequest) -> ConversationPage {
    let total = items.len() as u64;
    ConversationPage {
        items,
        pagination: Pagination {
            page: request.page,
            page_size: request.page_size,
            total,
            total_pages: 1,
        },
    }
}

/// `GET /agents` answers with a bare array or `{ "agents": [...] }`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AgentListResponse {
    Wrapped { agents: Vec<AgentSummary> },
    Bare(Vec<AgentSummary>),
}

impl AgentListResponse {
    pub fn into_agents(self) -> Vec<AgentSummary> {
        match self {
            AgentListResponse::Wrapped { agents } | AgentListResponse::Bare(agents) => agents,
        }
    }
}
