mod extract_values;
