mod types;

pub use types::{
    SEGMENT_INFO_EXTENSION, SegmentFiles, SegmentId, SegmentMeta, SegmentReadState, SegmentState,
    SegmentWriteState, segment_file_name,
};
