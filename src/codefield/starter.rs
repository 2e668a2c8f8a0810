//! Boilerplate a new block starts from, keyed by the editor's mode tag.

use once_cell::sync::Lazy;
use std::collections::BTreeMap;

pub static STARTER_CODE: Lazy<BTreeMap<&'static str, &'static str>> = Lazy::new(|| {
    BTreeMap::from([
        (
            "python",
            "def main():\n    # Your code here\n    print(\"Hello, Python!\")\n\nif __name__ == \"__main__\":\n    main()\n",
        ),
        (
            "text/x-java",
            "public class Main {\n    public static void main(String[] args) {\n        System.out.println(\"Hello, Java!\");\n    }\n}\n",
        ),
        (
            "text/x-c++src",
            "#include <iostream>\n\nint main() {\n    std::cout << \"Hello, C++!\" << std::endl;\n    return 0;\n}\n",
        ),
        (
            "text/x-csrc",
            "#include <stdio.h>\n\nint main() {\n    printf(\"Hello, C!\\n\");\n    return 0;\n}\n",
        ),
        (
            "javascript",
            "// Your code here\nconsole.log(\"Hello, JavaScript!\");\n",
        ),
        (
            "htmlmixed",
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n    <meta charset=\"UTF-8\">\n    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n    <title>Document</title>\n</head>\n<body>\n    \n</body>\n</html>\n",
        ),
        (
            "css",
            "/* Your CSS styles here */\nbody {\n    font-family: sans-serif;\n}\n",
        ),
        ("ruby", "# Your Ruby code here\nputs \"Hello, Ruby!\"\n"),
        (
            "text/x-kotlin",
            "fun main() {\n    println(\"Hello, Kotlin!\")\n}\n",
        ),
        ("sql", "-- Your SQL query here\nSELECT * FROM users;\n"),
    ])
});

pub fn starter_for(language: &str) -> Option<&'static str> {
    STARTER_CODE.get(language).copied()
}
