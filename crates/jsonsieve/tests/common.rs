#![allow(missing_docs, dead_code)]

/// One document cut into chunks on deliberately hostile seams: inside an
/// escaped decoy key, in the middle of a real detection pattern, between
/// the colon and the opening bracket, and inside a string whose content
/// looks structural.
#[rustfmt::skip]
pub const STREAM: [&str; 7] = [
    r#"{"meta":{"decision":"allow","reason":null},"notes":"embedded \"rec"#, // (decoy key, cut mid-escape)
    r#"ords\": [1,2] decoy","rec"#,                                          // real pattern starts, cut mid-key
    r#"ords":"#,                                                             // colon seen, bracket still pending
    r#" [{"id":0,"tag":"a]}"#,                                               // cut inside a string containing ] and }
    r#""},{"id":1,"tag":"b"},"#,                                             // element boundary on the seam
    r#"{"id":2,"tag":"c"}],"summ"#,                                          // next attribute cut mid-key
    r#"ary":{"status":"ok"}}"#,
];

pub fn original() -> String {
    STREAM.concat()
}
