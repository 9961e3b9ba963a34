pub mod nonresident;
pub mod page_queue;
pub mod page_table;

pub use nonresident::{BUCKET_SIZE, ExpiryCounts, NonResidentSet};
pub use page_queue::{PageQueue, PageQueueIter, QueueSet};
pub use page_table::{PageRecord, PageTable};
