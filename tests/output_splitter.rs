mod common;
use crate::common::{SharedBuffer, init_tracing, with_timeout};

use boot_k8s_cluster::exec::{OutputSplitter, SplitSummary};
use proptest::prelude::*;
use tokio::io::{AsyncWriteExt, BufReader};

const MARKER: &str = "USER-SUPPLIED VALUES:";

#[tokio::test]
async fn helm_debug_output_is_split_at_the_values_header() {
    init_tracing();
    let input = "debug: starting\nUSER-SUPPLIED VALUES:\nreplicas: 3\ndebug: done\n";
    let default = SharedBuffer::new();
    let redirect = SharedBuffer::new();

    let summary = OutputSplitter::new(MARKER)
        .split(input.as_bytes(), &mut default.clone(), &mut redirect.clone())
        .await
        .unwrap();

    assert_eq!(default.lines(), ["debug: starting"]);
    assert_eq!(redirect.lines(), ["replicas: 3", "debug: done"]);
    assert_eq!(
        summary,
        SplitSummary {
            default_lines: 1,
            redirected_lines: 2,
            marker_seen: true,
        }
    );
}

#[tokio::test]
async fn without_a_marker_everything_stays_on_the_default_sink() {
    init_tracing();
    let default = SharedBuffer::new();
    let redirect = SharedBuffer::new();

    let summary = OutputSplitter::new(MARKER)
        .split(&b"a\nb\n"[..], &mut default.clone(), &mut redirect.clone())
        .await
        .unwrap();

    assert_eq!(default.contents(), "a\nb\n");
    assert!(redirect.bytes().is_empty());
    assert!(!summary.marker_seen);
}

#[tokio::test]
async fn marker_as_last_line_redirects_nothing() {
    init_tracing();
    let default = SharedBuffer::new();
    let redirect = SharedBuffer::new();

    OutputSplitter::new(MARKER)
        .split(&b"a\nUSER-SUPPLIED VALUES:\n"[..], &mut default.clone(), &mut redirect.clone())
        .await
        .unwrap();

    assert_eq!(default.contents(), "a\n");
    assert!(redirect.bytes().is_empty());
}

#[tokio::test]
async fn spawned_splitter_finishes_when_the_writer_closes() {
    init_tracing();
    let (mut writer, reader) = tokio::io::duplex(16);
    let default = SharedBuffer::new();
    let redirect = SharedBuffer::new();

    let handle = OutputSplitter::new(MARKER).spawn(
        BufReader::new(reader),
        default.clone(),
        redirect.clone(),
    );

    // Larger than the pipe, so the splitter must be consuming concurrently.
    for i in 0..50 {
        writer.write_all(format!("debug line {i}\n").as_bytes()).await.unwrap();
    }
    writer.write_all(b"USER-SUPPLIED VALUES:\nreplicas: 3\n").await.unwrap();
    drop(writer);

    let summary = with_timeout(handle).await.unwrap().unwrap();
    assert_eq!(summary.default_lines, 50);
    assert_eq!(summary.redirected_lines, 1);
    assert_eq!(redirect.contents(), "replicas: 3\n");
}

fn split_blocking(lines: &[String]) -> (Vec<String>, Vec<String>) {
    let input: String = lines.iter().map(|l| format!("{l}\n")).collect();
    let default = SharedBuffer::new();
    let redirect = SharedBuffer::new();

    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    rt.block_on(
        OutputSplitter::new(MARKER).split(input.as_bytes(), &mut default.clone(), &mut redirect.clone()),
    )
    .unwrap();

    (default.lines(), redirect.lines())
}

proptest! {
    #[test]
    fn lines_before_the_first_marker_stay_and_lines_after_move(
        lines in proptest::collection::vec(
            prop_oneof![
                4 => "[a-z0-9: ]{0,20}",
                1 => Just(MARKER.to_string()),
            ],
            0..30,
        )
    ) {
        let (default, redirect) = split_blocking(&lines);

        match lines.iter().position(|l| l.contains(MARKER)) {
            Some(idx) => {
                prop_assert_eq!(&default[..], &lines[..idx]);
                prop_assert_eq!(&redirect[..], &lines[idx + 1..]);
            }
            None => {
                prop_assert_eq!(&default[..], &lines[..]);
                prop_assert!(redirect.is_empty());
            }
        }
    }
}
