/////////////////////////////TESTS////////////////////////////////////////////////////
/*
task document parser tests:
titles, keys and typed values
sections on one line and over several lines
comments and blank lines
template merge
malformed document
file-based parsing
*/

#[cfg(test)]
mod tests {
    use crate::Utils::task_parser::{
        DocumentMap, Value, filter_comments, parse_document, parse_document_as, parse_key,
        parse_key_value_pair, parse_section, parse_title, parse_value, parse_value_list,
    };
    use std::collections::HashMap;
    use std::fs::File;
    use std::io::{Read, Write};
    use tempfile::tempdir;

    #[test]
    fn test_parse_title_and_key() {
        let (remaining, title) = parse_title("coarse_case\n name: runs/coarse").unwrap();
        assert_eq!(title, "coarse_case");
        assert_eq!(remaining, "name: runs/coarse");

        let (remaining, key) = parse_key("medium_to_fine: 2.0").unwrap();
        assert_eq!(key, "medium_to_fine");
        assert_eq!(remaining, ": 2.0");
        assert!(parse_key("2key: 1").is_err());
    }

    #[test]
    fn test_parse_value_types() {
        let (remaining, value) = parse_value("alpha.water, next").unwrap();
        assert_eq!(value, Value::String("alpha.water".to_string()));
        assert_eq!(remaining, ", next");

        assert_eq!(parse_value("2").unwrap().1, Value::Integer(2));
        assert_eq!(parse_value("0.5").unwrap().1, Value::Float(0.5));
        assert_eq!(parse_value("1e-3").unwrap().1, Value::Float(1e-3));
        assert_eq!(parse_value("false").unwrap().1, Value::Boolean(false));
        assert_eq!(
            parse_value("runs/fine_1 type").unwrap().1,
            Value::String("runs/fine_1".to_string())
        );
    }

    #[test]
    fn test_leading_zero_tokens_stay_strings() {
        assert_eq!(parse_value("01").unwrap().1, Value::String("01".to_string()));
        assert_eq!(parse_value("007/run").unwrap().1, Value::String("007/run".to_string()));
        assert_eq!(parse_value("-05").unwrap().1, Value::String("-05".to_string()));
        assert_eq!(parse_value("0").unwrap().1, Value::Integer(0));
        assert_eq!(parse_value("0.05").unwrap().1, Value::Float(0.05));
        let parsed = parse_document_as("coarse_case name: 01 type: reconstructed", None).unwrap();
        let name = parsed["coarse_case"]["name"].as_ref().unwrap();
        assert_eq!(name[0].to_string_value(), "01");
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(Value::Integer(2).as_float(), Some(2.0));
        assert_eq!(Value::Float(0.25).as_float(), Some(0.25));
        assert_eq!(Value::String("x".to_string()).as_float(), None);
        assert_eq!(Value::Boolean(true).as_boolean(), Some(true));
        assert_eq!(Value::Integer(7).as_integer(), Some(7));
        assert_eq!(Value::Float(1.5).to_string(), "1.5");
    }

    #[test]
    fn test_parse_value_list() {
        let (remaining, values) = parse_value_list("p_rgh, U_x ,T").unwrap();
        assert_eq!(remaining, "");
        assert_eq!(
            values,
            vec![
                Value::String("p_rgh".to_string()),
                Value::String("U_x".to_string()),
                Value::String("T".to_string())
            ]
        );
    }

    #[test]
    fn test_parse_key_value_pair() {
        let (remaining, (key, values)) =
            parse_key_value_pair("start: 0.1  stride: 0.1").unwrap();
        assert_eq!(key, "start");
        assert_eq!(values, vec![Value::Float(0.1)]);
        assert_eq!(remaining, "stride: 0.1");
    }

    #[test]
    fn test_parse_section() {
        let (remaining, (title, section)) =
            parse_section("times start: 0.1 stride: 0.1 end: 1\ncontour array: alpha.water")
                .unwrap();
        assert_eq!(title, "times");
        assert_eq!(section.len(), 3);
        assert_eq!(section["end"], vec![Value::Integer(1)]);
        assert_eq!(remaining, "contour array: alpha.water");
    }

    #[test]
    fn test_parse_document_multiline_sections() {
        let doc = "refinement\n  coarse_to_medium: 2.0\n  medium_to_fine: 1.5\nlogging level: debug to_file: true";
        let (remaining, parsed) = parse_document(doc).unwrap();
        assert!(remaining.trim().is_empty());
        assert_eq!(parsed.len(), 2);
        assert_eq!(
            parsed["refinement"]["medium_to_fine"],
            Some(vec![Value::Float(1.5)])
        );
        assert_eq!(parsed["logging"]["to_file"], Some(vec![Value::Boolean(true)]));
    }

    #[test]
    fn test_filter_comments() {
        let doc = "// header\n# note\ntimes start: 1\n\n% matlab style\n; ini style\ncontour value: 0.5";
        assert_eq!(filter_comments(doc), "times start: 1\ncontour value: 0.5");
    }

    #[test]
    fn test_parse_document_as_with_template() {
        let doc = "# output is optional\ntimes start: 0.1 stride: 0.1 end: 0.5";
        let mut template: DocumentMap = HashMap::new();
        template.insert(
            "times".to_string(),
            HashMap::from([("start".to_string(), None), ("offset".to_string(), None)]),
        );
        template.insert(
            "output".to_string(),
            HashMap::from([("report".to_string(), None)]),
        );
        let parsed = parse_document_as(doc, Some(&template)).unwrap();
        assert_eq!(parsed["times"]["start"], Some(vec![Value::Float(0.1)]));
        assert_eq!(parsed["times"]["offset"], None);
        assert_eq!(parsed["output"]["report"], None);
    }

    #[test]
    fn test_malformed_document() {
        assert!(parse_document_as("times start 0.1", None).is_err());
        assert!(parse_document_as("", None).is_err());
        assert!(parse_document_as("times start: 0.1\n: orphan", None).is_err());
    }

    #[test]
    fn test_parse_document_from_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("task.txt");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "// three grid study").unwrap();
        writeln!(file, "coarse_case name: runs/coarse type: reconstructed").unwrap();
        writeln!(file, "data").unwrap();
        writeln!(file, "  names: p_rgh, U_x").unwrap();

        let mut contents = String::new();
        File::open(&file_path)
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        let parsed = parse_document_as(&contents, None).unwrap();
        assert_eq!(
            parsed["coarse_case"]["name"],
            Some(vec![Value::String("runs/coarse".to_string())])
        );
        assert_eq!(
            parsed["data"]["names"].as_ref().map(|v| v.len()),
            Some(2)
        );
    }
}
